//! Engine configuration, loaded from an optional file plus environment
//! overrides (`ORGFLOW_*`).

use ::config::{Config, ConfigError, Environment, File, FileFormat};
use chrono::Duration;
use serde::Deserialize;

use crate::sync::DEFAULT_FAN_OUT_CONCURRENCY;

const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Tunables for sync runs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// How far back a connector with no history starts syncing.
    pub lookback_days: i64,
    /// Upper bound on concurrently running fan-out tasks.
    pub fan_out_concurrency: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            fan_out_concurrency: DEFAULT_FAN_OUT_CONCURRENCY,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sync: SyncSettings,
}

impl EngineConfig {
    /// Load from `orgflow.toml` (optional) with `ORGFLOW_*` environment
    /// overrides, e.g. `ORGFLOW_SYNC__LOOKBACK_DAYS=7`.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("orgflow").format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("ORGFLOW").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// The configured lookback as a duration.
    #[must_use]
    pub fn lookback(&self) -> Duration {
        Duration::days(self.sync.lookback_days)
    }
}
