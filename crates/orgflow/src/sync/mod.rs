//! The synchronization engine.

mod context;
mod filter;
mod history;
mod parallel;
mod service;
mod status;
mod stream;
mod types;

pub use context::{
    ConnectorConfig, PROP_SYNC_CHANNEL_GROUPS, SyncContext, SyncContextBuilder, SyncContextError,
};
pub use filter::{InteractionsFilter, create_interactions_filter};
pub use history::{
    HistoryError, InMemorySyncHistory, SyncHistoryEntry, SyncHistoryRepository, SyncHistoryService,
};
pub use parallel::{ParallelFetcher, ParallelTask, ProgressCallback, emit};
pub use service::SyncService;
pub use status::{TaskStatus, TasksStatusCache, progress_reporter};
pub use stream::FilteredInteractionsStream;
pub use types::{DEFAULT_FAN_OUT_CONCURRENCY, SyncError, SyncOutcome, SyncResult};
