//! Orgflow: a parallel synchronization engine for organizational
//! interaction data.
//!
//! Given a time window and an employee directory, the engine fans out
//! per-resource fetch tasks against a vendor [`DataSource`], streams the
//! resulting interactions through a filtering/deduplication pipeline into
//! an [`AnalyticsBackend`], reports fractional progress, and consolidates
//! each run into a [`SyncResult`] with partial-failure accounting.
//!
//! Vendor API clients and durable persistence live outside the crate;
//! [`DataSource`], [`AnalyticsBackend`], and
//! [`SyncHistoryRepository`](sync::SyncHistoryRepository) are the seams.

pub mod backend;
pub mod config;
pub mod hashing;
pub mod model;
pub mod source;
pub mod sync;

pub use backend::{AccessToken, AnalyticsBackend, BackendError, InteractionsStream, StatusLogger};
pub use config::EngineConfig;
pub use hashing::{HashFunction, HmacSha256HashFunction};
pub use model::{
    Employee, EmployeeCollection, EmployeeKind, EmployeeLookup, Group, Interaction,
    InteractionKind, TimeRange,
};
pub use source::{DataSource, SourceError};
pub use sync::{
    ParallelFetcher, ParallelTask, ProgressCallback, SyncContext, SyncError, SyncOutcome,
    SyncResult, SyncService, TasksStatusCache,
};
