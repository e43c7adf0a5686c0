//! Best-effort task status snapshots for in-flight syncs.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sync::parallel::ProgressCallback;

/// Snapshot of what a connector's sync is currently doing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub caption: String,
    pub description: String,
    /// Fractional progress in `[0.0, 100.0]`, when the phase reports one.
    pub progress: Option<f64>,
}

impl TaskStatus {
    pub fn new(caption: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
            description: description.into(),
            progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// Shared last-write-wins status map keyed by connector id.
///
/// Always an explicit injected handle, shared via `Arc`. Statuses are
/// advisory: readers may observe a slightly stale snapshot and entries for
/// finished syncs linger until overwritten.
#[derive(Debug, Default)]
pub struct TasksStatusCache {
    statuses: RwLock<HashMap<Uuid, TaskStatus>>,
}

impl TasksStatusCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&self, connector_id: Uuid, status: TaskStatus) {
        self.statuses
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(connector_id, status);
    }

    #[must_use]
    pub fn get_status(&self, connector_id: Uuid) -> Option<TaskStatus> {
        self.statuses
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&connector_id)
            .cloned()
    }
}

/// Adapt a status cache into a fan-out [`ProgressCallback`]: every percent
/// update overwrites the connector's status with the given caption and
/// description.
#[must_use]
pub fn progress_reporter(
    cache: Arc<TasksStatusCache>,
    connector_id: Uuid,
    caption: impl Into<String>,
    description: impl Into<String>,
) -> ProgressCallback {
    let caption = caption.into();
    let description = description.into();
    Box::new(move |percent| {
        cache.set_status(
            connector_id,
            TaskStatus::new(caption.clone(), description.clone()).with_progress(percent),
        );
    })
}
