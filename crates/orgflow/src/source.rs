//! Abstract surface of a vendor data source (Google, Microsoft, Slack, ...).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::backend::InteractionsStream;
use crate::model::EmployeeCollection;
use crate::sync::{SyncContext, SyncResult};

/// Errors surfaced by data source operations.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The vendor API rejected the request.
    #[error("source API error: {message}")]
    Api { message: String },

    /// The vendor throttled us.
    #[error("source rate limited until {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    /// Vendor credentials were missing or revoked.
    #[error("source authentication required")]
    AuthRequired,

    /// A queried resource does not exist.
    #[error("source resource not found: {resource}")]
    NotFound { resource: String },

    /// Transport-level failure.
    #[error("source network error: {message}")]
    Network { message: String },

    /// Invariant violation inside a source client.
    #[error("internal source error: {message}")]
    Internal { message: String },
}

impl SourceError {
    #[inline]
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    #[inline]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    #[inline]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Short single-line rendering of an error for status log lines.
#[must_use]
pub fn short_error_message(err: &dyn std::error::Error) -> String {
    let text = err.to_string();
    match text.split_once('\n') {
        Some((first, _)) => first.to_string(),
        None => text,
    }
}

/// A vendor integration the engine can sync from.
///
/// Implementations own the vendor API calls, pagination, and the
/// skip-and-note convention for per-item failures: an item that cannot be
/// fetched is recorded in the returned [`SyncResult`]'s errors instead of
/// aborting the run.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Stable identifier of the vendor ("google", "microsoft", "slack").
    fn source_id(&self) -> &str;

    /// Fetch the employee directory and pseudonymize it with the context's
    /// hash function.
    async fn get_hashed_employees(
        &self,
        ctx: &SyncContext,
    ) -> Result<EmployeeCollection, SourceError>;

    /// Fan out over the directory, streaming interaction batches into
    /// `stream`, and consolidate the run into a [`SyncResult`].
    ///
    /// Implementations must not close the stream; the orchestrator owns the
    /// stream lifecycle.
    async fn sync_interactions(
        &self,
        stream: Arc<dyn InteractionsStream>,
        ctx: &SyncContext,
    ) -> Result<SyncResult, SourceError>;
}
