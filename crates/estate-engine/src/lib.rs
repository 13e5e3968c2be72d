//! Derived-state logic shared by the list, detail and dashboard views:
//! filtering and sorting, tracker progress, risk badges, notification
//! state and dashboard stats. Everything here is pure and synchronous.

pub mod filter;
pub mod notifications;
pub mod progress;
pub mod risk;
pub mod stats;
pub mod template;

pub use filter::{apply, filter, FilterCriteria, NumericRange, SortDirection, SortSpec, ALL};
pub use notifications::NotificationInbox;
pub use progress::{aggregate, update_step_status, ProgressSummary};
pub use risk::{RiskBand, RiskThresholds};

use estate_types::{LegalTracker, Report, RiskLevel};
use serde::{Deserialize, Serialize};

/// Progress plus risk badge for one tracker card
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerOverview {
    pub progress: ProgressSummary,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
}

/// EstateEngine entry point, holding the tunable classification tables
#[derive(Debug, Clone, Default)]
pub struct EstateEngine {
    risk: RiskThresholds,
}

impl EstateEngine {
    pub fn new(risk: RiskThresholds) -> Self {
        Self { risk }
    }

    pub fn risk_thresholds(&self) -> &RiskThresholds {
        &self.risk
    }

    pub fn classify_risk(&self, score: f64) -> RiskLevel {
        self.risk.classify(score)
    }

    pub fn tracker_overview(&self, tracker: &LegalTracker) -> TrackerOverview {
        let risk_score = progress::outstanding_risk_score(&tracker.steps);
        TrackerOverview {
            progress: aggregate(&tracker.steps),
            risk_score,
            risk_level: self.risk.classify(risk_score),
        }
    }

    /// Risk badge for a report, if it has been scored
    pub fn report_risk(&self, report: &Report) -> Option<RiskLevel> {
        report.risk_score.map(|score| self.risk.classify(score))
    }
}
