//! Abstract surface of the receiving analytics backend.
//!
//! The engine never talks HTTP itself; concrete backend clients implement
//! these traits. Everything here is `dyn`-friendly so orchestration code and
//! tests can swap implementations freely.

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{Group, Interaction, TimeRange};

/// Opaque backend credential.
///
/// `Debug` and `Display` are redacted so the token can never leak through
/// structured logging or error messages.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw credential, for building backend requests only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(***)")
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

/// Errors surfaced by backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend rejected the request.
    #[error("backend API error: {message}")]
    Api { message: String },

    /// The credential was missing, expired, or revoked.
    #[error("backend authentication required")]
    AuthRequired,

    /// Transport-level failure.
    #[error("backend network error: {message}")]
    Network { message: String },

    /// Invariant violation inside a backend client.
    #[error("internal backend error: {message}")]
    Internal { message: String },
}

impl BackendError {
    #[inline]
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
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
    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired)
    }
}

/// An open channel accepting interaction batches for one sync run.
///
/// Implementations must tolerate concurrent `send` calls; fan-out tasks
/// share a single stream handle.
#[async_trait]
pub trait InteractionsStream: Send + Sync {
    /// Submit a deduplicated batch. Returns the number of interactions the
    /// backend accepted.
    async fn send(&self, batch: HashSet<Interaction>) -> Result<usize, BackendError>;

    /// Finish the stream. Callers must not `send` afterwards.
    async fn close(&self) -> Result<(), BackendError>;
}

/// The analytics backend the engine reports to and streams into.
#[async_trait]
pub trait AnalyticsBackend: Send + Sync {
    /// Resolve the credential to the network it belongs to.
    async fn validate_token(&self, token: &AccessToken) -> Result<Uuid, BackendError>;

    /// Announce that a sync over `period` is starting.
    async fn report_sync_start(
        &self,
        token: &AccessToken,
        period: &TimeRange,
    ) -> Result<(), BackendError>;

    /// Announce that the sync over `period` completed.
    async fn report_sync_success(
        &self,
        token: &AccessToken,
        period: &TimeRange,
    ) -> Result<(), BackendError>;

    /// Announce that the sync over `period` failed. Best-effort: callers
    /// log, never re-raise, errors from this call.
    async fn try_report_sync_failed(
        &self,
        token: &AccessToken,
        period: &TimeRange,
        reason: &str,
    ) -> Result<(), BackendError>;

    /// Replace the group catalog for this connector.
    async fn push_groups(&self, token: &AccessToken, groups: Vec<Group>)
    -> Result<(), BackendError>;

    /// Open an interactions stream for the given vendor source.
    async fn open_interactions_stream(
        &self,
        token: &AccessToken,
        source_id: &str,
    ) -> Result<Box<dyn InteractionsStream>, BackendError>;
}

/// Customer-visible sync status log, rendered in the backend's admin UI.
///
/// Distinct from `tracing`: these messages are for connector operators, not
/// engine developers.
#[async_trait]
pub trait StatusLogger: Send + Sync {
    async fn log_info(&self, message: &str);
    async fn log_warning(&self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("super-secret-credential");
        assert_eq!(format!("{token:?}"), "AccessToken(***)");
        assert_eq!(token.to_string(), "***");
        assert!(!format!("{token:?}").contains("secret"));
    }

    #[test]
    fn test_access_token_expose_returns_raw_value() {
        let token = AccessToken::new("abc123");
        assert_eq!(token.expose(), "abc123");
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(BackendError::api("nope"), BackendError::Api { .. }));
        assert!(matches!(
            BackendError::network("reset"),
            BackendError::Network { .. }
        ));
        assert!(BackendError::AuthRequired.is_auth_required());
        assert!(!BackendError::internal("bug").is_auth_required());
    }
}
