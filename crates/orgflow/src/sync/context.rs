//! Immutable per-run sync context and its builder.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::backend::{AccessToken, StatusLogger};
use crate::hashing::HashFunction;
use crate::model::TimeRange;
use crate::sync::status::TasksStatusCache;

/// Property enabling the push of channel-category groups to the backend.
pub const PROP_SYNC_CHANNEL_GROUPS: &str = "sync_channel_groups";

/// Per-connector settings configured by the operator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// When non-empty, restrict the sync to these employee identifiers.
    #[serde(default)]
    pub employee_filter: Vec<String>,
    /// Vendor attribute name -> canonical attribute name.
    #[serde(default)]
    pub custom_attributes: HashMap<String, String>,
}

/// Errors that occur when building a sync context.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncContextError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
}

/// Everything one sync run needs, assembled once and shared read-only.
///
/// Cloning is cheap; collaborator handles are `Arc`s and the rest is small
/// value data.
#[derive(Clone)]
pub struct SyncContext {
    connector_id: Uuid,
    network_id: Uuid,
    config: ConnectorConfig,
    properties: HashMap<String, String>,
    token: AccessToken,
    time_range: TimeRange,
    hasher: Option<Arc<dyn HashFunction>>,
    status_logger: Option<Arc<dyn StatusLogger>>,
    status_cache: Option<Arc<TasksStatusCache>>,
    cancel: CancellationToken,
}

impl SyncContext {
    #[must_use]
    pub fn builder() -> SyncContextBuilder {
        SyncContextBuilder::default()
    }

    #[must_use]
    pub fn connector_id(&self) -> Uuid {
        self.connector_id
    }

    #[must_use]
    pub fn network_id(&self) -> Uuid {
        self.network_id
    }

    #[must_use]
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    #[must_use]
    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    #[must_use]
    pub fn time_range(&self) -> &TimeRange {
        &self.time_range
    }

    #[must_use]
    pub fn hasher(&self) -> Option<&Arc<dyn HashFunction>> {
        self.hasher.as_ref()
    }

    #[must_use]
    pub fn status_logger(&self) -> Option<&Arc<dyn StatusLogger>> {
        self.status_logger.as_ref()
    }

    #[must_use]
    pub fn status_cache(&self) -> Option<&Arc<TasksStatusCache>> {
        self.status_cache.as_ref()
    }

    /// The advisory cancellation token for this run.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Raw property value, if set.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Boolean property with a default for unset or unparseable values.
    #[must_use]
    pub fn bool_property(&self, key: &str, default: bool) -> bool {
        match self.properties.get(key).map(String::as_str) {
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => default,
            },
            None => default,
        }
    }
}

impl fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncContext")
            .field("connector_id", &self.connector_id)
            .field("network_id", &self.network_id)
            .field("time_range", &self.time_range)
            .field("token", &self.token)
            .field("properties", &self.properties.len())
            .finish()
    }
}

/// Builder validating required fields before a context exists.
#[derive(Default)]
pub struct SyncContextBuilder {
    connector_id: Option<Uuid>,
    network_id: Option<Uuid>,
    config: ConnectorConfig,
    properties: HashMap<String, String>,
    token: Option<AccessToken>,
    time_range: Option<TimeRange>,
    hasher: Option<Arc<dyn HashFunction>>,
    status_logger: Option<Arc<dyn StatusLogger>>,
    status_cache: Option<Arc<TasksStatusCache>>,
    cancel: Option<CancellationToken>,
}

impl SyncContextBuilder {
    #[must_use]
    pub fn connector_id(mut self, connector_id: Uuid) -> Self {
        self.connector_id = Some(connector_id);
        self
    }

    /// Defaults to the connector id when unset.
    #[must_use]
    pub fn network_id(mut self, network_id: Uuid) -> Self {
        self.network_id = Some(network_id);
        self
    }

    #[must_use]
    pub fn config(mut self, config: ConnectorConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn token(mut self, token: AccessToken) -> Self {
        self.token = Some(token);
        self
    }

    #[must_use]
    pub fn time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = Some(time_range);
        self
    }

    #[must_use]
    pub fn hasher(mut self, hasher: Arc<dyn HashFunction>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    #[must_use]
    pub fn status_logger(mut self, status_logger: Arc<dyn StatusLogger>) -> Self {
        self.status_logger = Some(status_logger);
        self
    }

    #[must_use]
    pub fn status_cache(mut self, status_cache: Arc<TasksStatusCache>) -> Self {
        self.status_cache = Some(status_cache);
        self
    }

    #[must_use]
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn build(self) -> Result<SyncContext, SyncContextError> {
        let connector_id = self
            .connector_id
            .ok_or(SyncContextError::MissingField {
                field: "connector_id",
            })?;
        let token = self
            .token
            .ok_or(SyncContextError::MissingField { field: "token" })?;
        let time_range = self
            .time_range
            .ok_or(SyncContextError::MissingField { field: "time_range" })?;

        Ok(SyncContext {
            connector_id,
            network_id: self.network_id.unwrap_or(connector_id),
            config: self.config,
            properties: self.properties,
            token,
            time_range,
            hasher: self.hasher,
            status_logger: self.status_logger,
            status_cache: self.status_cache,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> SyncContextBuilder {
        SyncContext::builder()
            .connector_id(Uuid::new_v4())
            .token(AccessToken::new("t"))
            .time_range(TimeRange::unbounded())
    }

    #[test]
    fn test_build_with_required_fields() {
        let ctx = minimal().build().unwrap();
        assert_eq!(ctx.network_id(), ctx.connector_id());
        assert!(!ctx.cancellation().is_cancelled());
        assert!(ctx.hasher().is_none());
    }

    #[test]
    fn test_missing_required_fields() {
        let err = SyncContext::builder()
            .token(AccessToken::new("t"))
            .time_range(TimeRange::unbounded())
            .build()
            .expect_err("connector id missing");
        assert_eq!(err, SyncContextError::MissingField {
            field: "connector_id"
        });

        let err = SyncContext::builder()
            .connector_id(Uuid::new_v4())
            .time_range(TimeRange::unbounded())
            .build()
            .expect_err("token missing");
        assert_eq!(err, SyncContextError::MissingField { field: "token" });

        let err = SyncContext::builder()
            .connector_id(Uuid::new_v4())
            .token(AccessToken::new("t"))
            .build()
            .expect_err("time range missing");
        assert_eq!(err, SyncContextError::MissingField { field: "time_range" });
    }

    #[test]
    fn test_bool_property_parsing() {
        let ctx = minimal()
            .property("sync_channel_groups", "TRUE")
            .property("flag_off", "0")
            .build()
            .unwrap();

        assert!(ctx.bool_property("sync_channel_groups", false));
        assert!(!ctx.bool_property("flag_off", true));
        assert!(ctx.bool_property("unset", true), "default applies when unset");
        assert!(!ctx.bool_property("unset", false));
    }

    #[test]
    fn test_bool_property_falls_back_on_unparseable_values() {
        let ctx = minimal().property("flag", "maybe").build().unwrap();

        assert!(ctx.bool_property("flag", true));
        assert!(!ctx.bool_property("flag", false));
    }

    #[test]
    fn test_debug_never_shows_the_token() {
        let ctx = minimal().token(AccessToken::new("super-secret")).build().unwrap();
        let rendered = format!("{ctx:?}");
        assert!(rendered.contains("AccessToken(***)"));
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn test_explicit_network_id_is_kept() {
        let network = Uuid::new_v4();
        let ctx = minimal().network_id(network).build().unwrap();
        assert_eq!(ctx.network_id(), network);
    }
}
