//! Progress aggregation and step updates for legal trackers.
//!
//! Nothing here stores progress: every number is recomputed from the steps,
//! and updates return a new tracker instead of mutating the one passed in.

use chrono::{DateTime, Utc};
use estate_types::{EstateError, LegalTracker, Result, Step, StepStatus};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub verified_count: usize,
    pub pending_count: usize,
    pub not_verified_count: usize,
    pub total: usize,
    /// Whole percent of verified steps, 0 for an empty tracker
    pub overall_progress: u8,
}

pub fn aggregate(steps: &[Step]) -> ProgressSummary {
    let mut summary = ProgressSummary {
        total: steps.len(),
        ..ProgressSummary::default()
    };
    for step in steps {
        match step.status {
            StepStatus::Verified => summary.verified_count += 1,
            StepStatus::Pending => summary.pending_count += 1,
            StepStatus::NotVerified => summary.not_verified_count += 1,
        }
    }
    summary.overall_progress = percent(summary.verified_count, summary.total);
    summary
}

/// `round(100 * part / total)` with halves rounded up, in integer arithmetic
pub fn percent(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let part = part.min(total) as u64;
    let total = total as u64;
    ((200 * part + total) / (2 * total)) as u8
}

/// Returns a copy of `tracker` with one step moved to `status`.
///
/// Entering `verified` stamps `date_verified` with `now`; re-verifying an
/// already verified step keeps its original date. Any other status clears it.
pub fn update_step_status(
    tracker: &LegalTracker,
    step_id: &str,
    status: StepStatus,
    now: DateTime<Utc>,
) -> Result<LegalTracker> {
    let index = tracker
        .steps
        .iter()
        .position(|s| s.id == step_id)
        .ok_or_else(|| EstateError::not_found("step", step_id))?;

    let mut updated = tracker.clone();
    let step = &mut updated.steps[index];
    let previous = step.status;
    step.date_verified = match (previous, status) {
        (StepStatus::Verified, StepStatus::Verified) => step.date_verified.or(Some(now)),
        (_, StepStatus::Verified) => Some(now),
        _ => None,
    };
    step.status = status;

    debug!(
        tracker = %tracker.id,
        step = step_id,
        from = %previous,
        to = %status,
        "step status updated"
    );
    Ok(updated)
}

/// Returns a copy of `tracker` with the notes of one step replaced
pub fn annotate_step(tracker: &LegalTracker, step_id: &str, notes: Option<String>) -> Result<LegalTracker> {
    let mut updated = tracker.clone();
    let step = updated
        .steps
        .iter_mut()
        .find(|s| s.id == step_id)
        .ok_or_else(|| EstateError::not_found("step", step_id))?;
    step.notes = notes.filter(|n| !n.trim().is_empty());
    Ok(updated)
}

/// Priority-weighted share of unverified work, scaled to 0..=10.
///
/// Not-verified steps count their full weight, pending steps half of it.
pub fn outstanding_risk_score(steps: &[Step]) -> f64 {
    let total: u32 = steps.iter().map(|s| s.priority.weight()).sum();
    if total == 0 {
        return 0.0;
    }
    let outstanding: f64 = steps
        .iter()
        .map(|s| match s.status {
            StepStatus::Verified => 0.0,
            StepStatus::Pending => f64::from(s.priority.weight()) / 2.0,
            StepStatus::NotVerified => f64::from(s.priority.weight()),
        })
        .sum();
    10.0 * outstanding / f64::from(total)
}
