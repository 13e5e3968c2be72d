//! Legal due-diligence trackers: reads, step updates and the derived cards

use chrono::{DateTime, Utc};
use estate_engine::progress::annotate_step;
use estate_engine::template::seed_tracker;
use estate_engine::{update_step_status, EstateEngine, FilterCriteria, TrackerOverview};
use estate_types::{LegalTracker, Result, StepStatus};
use serde_json::json;
use tracing::info;

use crate::path::ResourcePath;
use crate::repository::Repository;

pub struct TrackerService {
    trackers: Repository<LegalTracker>,
    engine: EstateEngine,
}

impl TrackerService {
    pub fn new(trackers: Repository<LegalTracker>, engine: EstateEngine) -> Self {
        Self { trackers, engine }
    }

    pub async fn get(&self, id: &str) -> Result<LegalTracker> {
        self.trackers.get(id).await
    }

    pub async fn list(&self, criteria: &FilterCriteria) -> Result<Vec<LegalTracker>> {
        self.trackers.list(criteria).await
    }

    /// Opens a tracker for a property with every template step pending
    pub async fn open(
        &self,
        id: &str,
        property_id: &str,
        title: &str,
        now: DateTime<Utc>,
    ) -> Result<LegalTracker> {
        let tracker = seed_tracker(id, property_id, title, now);
        self.trackers.create(&tracker).await
    }

    /// Progress counts and risk badge, always derived from the current steps
    pub async fn summary(&self, id: &str) -> Result<TrackerOverview> {
        let tracker = self.get(id).await?;
        Ok(self.engine.tracker_overview(&tracker))
    }

    /// Moves one step to `status`.
    ///
    /// The step must exist in the cached tracker; otherwise nothing is sent.
    /// The cached tracker shows the new status while the PATCH is in flight
    /// and is restored if the backend rejects it.
    pub async fn update_step_status(
        &self,
        tracker_id: &str,
        step_id: &str,
        status: StepStatus,
        now: DateTime<Utc>,
    ) -> Result<LegalTracker> {
        let tracker = self.get(tracker_id).await?;
        let updated = update_step_status(&tracker, step_id, status, now)?;
        let step = updated.step(step_id).cloned();
        let body = json!({
            "status": status,
            "dateVerified": step.and_then(|s| s.date_verified),
        });
        self.patch_step(&updated, step_id, body).await?;
        info!(tracker = tracker_id, step = step_id, status = %status, "step status updated");
        Ok(updated)
    }

    /// Replaces the free-text notes of one step
    pub async fn annotate_step(
        &self,
        tracker_id: &str,
        step_id: &str,
        notes: Option<String>,
    ) -> Result<LegalTracker> {
        let tracker = self.get(tracker_id).await?;
        let updated = annotate_step(&tracker, step_id, notes.clone())?;
        self.patch_step(&updated, step_id, json!({ "notes": notes })).await?;
        Ok(updated)
    }

    async fn patch_step(&self, updated: &LegalTracker, step_id: &str, body: serde_json::Value) -> Result<()> {
        let record_key = self.trackers.record_key(&updated.id);
        let optimistic = serde_json::to_value(updated)?;
        let path = ResourcePath::record::<LegalTracker>(&updated.id)
            .segment("steps")
            .segment(step_id);
        let rest = self.trackers.rest();

        self.trackers
            .cache()
            .mutate_optimistic(&record_key, move |_| optimistic, || rest.patch(&path, body), &[])
            .await?;
        self.trackers.invalidate().await;
        Ok(())
    }
}
