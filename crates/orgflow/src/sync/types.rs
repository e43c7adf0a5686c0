//! Result and outcome types for sync runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::backend::BackendError;
use crate::model::TimeRange;
use crate::source::SourceError;

/// Default upper bound on concurrently running fan-out tasks.
pub const DEFAULT_FAN_OUT_CONCURRENCY: usize = 20;

/// Consolidated result of one sync run with partial-failure accounting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncResult {
    /// Interactions accepted by the backend after filtering.
    pub interactions_count: u64,
    /// Fan-out tasks attempted.
    pub tasks_count: u64,
    /// One entry per task that was skipped-and-noted.
    pub errors: Vec<String>,
}

impl SyncResult {
    #[must_use]
    pub fn new(interactions_count: u64, tasks_count: u64, errors: Vec<String>) -> Self {
        Self {
            interactions_count,
            tasks_count,
            errors,
        }
    }

    /// Percentage of tasks that completed without a noted error.
    ///
    /// A run with zero tasks is vacuously fully successful.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.tasks_count == 0 {
            return 100.0;
        }
        let failed = self.errors.len().min(self.tasks_count as usize) as f64;
        100.0 * (self.tasks_count as f64 - failed) / self.tasks_count as f64
    }

    /// Fold another result into this one (multi-phase sources).
    pub fn merge(&mut self, other: SyncResult) {
        self.interactions_count += other.interactions_count;
        self.tasks_count += other.tasks_count;
        self.errors.extend(other.errors);
    }
}

/// What a completed sync run produced, returned to schedulers.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub connector_id: Uuid,
    pub period: TimeRange,
    pub result: SyncResult,
}

/// Failure of a sync run, tagged with the pipeline stage that failed.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to report sync start: {0}")]
    Start(#[source] BackendError),

    #[error("failed to resolve employees: {0}")]
    Employees(#[source] SourceError),

    #[error("failed to push groups: {0}")]
    Groups(#[source] BackendError),

    #[error("failed to open interactions stream: {0}")]
    OpenStream(#[source] BackendError),

    #[error("interaction sync failed: {0}")]
    Interactions(#[source] SourceError),

    #[error("failed to report sync success: {0}")]
    SuccessReport(#[source] BackendError),
}
