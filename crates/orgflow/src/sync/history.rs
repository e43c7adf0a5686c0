//! Append-only sync history and resumption-point evaluation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::TimeRange;
use crate::sync::types::SyncResult;

/// Errors surfaced by history storage.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history storage error: {message}")]
    Storage { message: String },
}

impl HistoryError {
    #[inline]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// One record of a completed (or marker) sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncHistoryEntry {
    pub connector_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub sync_period: TimeRange,
    pub interactions_count: u64,
    pub tasks_count: u64,
    pub success_rate: f64,
}

impl SyncHistoryEntry {
    pub fn new(
        connector_id: Uuid,
        timestamp: DateTime<Utc>,
        sync_period: TimeRange,
        result: &SyncResult,
    ) -> Self {
        Self {
            connector_id,
            timestamp,
            sync_period,
            interactions_count: result.interactions_count,
            tasks_count: result.tasks_count,
            success_rate: result.success_rate(),
        }
    }

    /// Zero-duration marker entry used to override the next resumption
    /// point without claiming any work happened.
    fn marker(connector_id: Uuid, at: DateTime<Utc>) -> Self {
        Self {
            connector_id,
            timestamp: Utc::now(),
            // Zero-duration ranges are always valid.
            sync_period: TimeRange::bounded(at, at).unwrap_or_else(|_| TimeRange::since(at)),
            interactions_count: 0,
            tasks_count: 0,
            success_rate: 100.0,
        }
    }
}

/// Append-only storage for history entries. Persistence lives outside the
/// engine; [`InMemorySyncHistory`] ships for tests and embedding.
#[async_trait]
pub trait SyncHistoryRepository: Send + Sync {
    /// Most recently appended entry for the connector, if any.
    async fn find_last(&self, connector_id: Uuid)
    -> Result<Option<SyncHistoryEntry>, HistoryError>;

    async fn append(&self, entry: SyncHistoryEntry) -> Result<(), HistoryError>;
}

/// Vec-backed repository. Entries are never mutated or removed.
#[derive(Debug, Default)]
pub struct InMemorySyncHistory {
    entries: RwLock<Vec<SyncHistoryEntry>>,
}

impl InMemorySyncHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries for a connector, oldest first.
    #[must_use]
    pub fn entries_for(&self, connector_id: Uuid) -> Vec<SyncHistoryEntry> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| e.connector_id == connector_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SyncHistoryRepository for InMemorySyncHistory {
    async fn find_last(
        &self,
        connector_id: Uuid,
    ) -> Result<Option<SyncHistoryEntry>, HistoryError> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .rev()
            .find(|e| e.connector_id == connector_id)
            .cloned())
    }

    async fn append(&self, entry: SyncHistoryEntry) -> Result<(), HistoryError> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry);
        Ok(())
    }
}

/// Evaluates where the next sync should resume and records completed runs.
///
/// Resumption points are monotone under normal operation: each completed
/// run's period end becomes the next run's start, so windows tile without
/// gaps.
pub struct SyncHistoryService {
    repository: Arc<dyn SyncHistoryRepository>,
    lookback: Duration,
}

impl SyncHistoryService {
    pub fn new(repository: Arc<dyn SyncHistoryRepository>, lookback: Duration) -> Self {
        Self {
            repository,
            lookback,
        }
    }

    /// Where the next sync window should start.
    ///
    /// The last entry's period end wins; a connector with no history starts
    /// `lookback` before now. Entries with an open-ended period fall back
    /// to the entry's own timestamp.
    pub async fn evaluate_sync_start(
        &self,
        connector_id: Uuid,
    ) -> Result<DateTime<Utc>, HistoryError> {
        match self.repository.find_last(connector_id).await? {
            Some(entry) => Ok(entry.sync_period.end().unwrap_or(entry.timestamp)),
            None => Ok(Utc::now() - self.lookback),
        }
    }

    /// Force the next sync to resume from `at` by appending a zero-duration
    /// marker entry. History already written stays untouched.
    pub async fn override_sync_start(
        &self,
        connector_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), HistoryError> {
        self.repository
            .append(SyncHistoryEntry::marker(connector_id, at))
            .await
    }

    /// Record a completed run. Pure append.
    pub async fn save_log(&self, entry: SyncHistoryEntry) -> Result<(), HistoryError> {
        self.repository.append(entry).await
    }
}
