//! Configuration layer: typed settings with layered precedence (file → env).

use std::collections::HashMap;
use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::types::EntityKind;

const DEFAULT_CONFIG_BASENAME: &str = "agora";
const ENV_PREFIX: &str = "AGORA";

const DEFAULT_STALE_MS: u64 = 180_000;
const SETTLED_STALE_MS: u64 = 300_000;
const DEFAULT_DASHBOARD_STALE_MS: u64 = 300_000;
const DEFAULT_RETAIN_MS: u64 = 600_000;
const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60_000;
const DEFAULT_CONSUME_BATCH_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cache: CacheSettings,
}

/// Cache tunables as they appear in `agora.toml` under `[cache]`.
///
/// Staleness windows default to three minutes, with slower-moving kinds
/// (announcements, scholarships) and the dashboard at five; all of them are
/// per-kind tunables, not fixed policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub default_stale_ms: u64,
    pub stale_ms: HashMap<EntityKind, u64>,
    pub dashboard_stale_ms: u64,
    pub retain_ms: u64,
    pub sweep_interval_ms: u64,
    pub consume_batch_limit: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let mut stale_ms = HashMap::new();
        stale_ms.insert(EntityKind::Announcements, SETTLED_STALE_MS);
        stale_ms.insert(EntityKind::Scholarships, SETTLED_STALE_MS);

        Self {
            default_stale_ms: DEFAULT_STALE_MS,
            stale_ms,
            dashboard_stale_ms: DEFAULT_DASHBOARD_STALE_MS,
            retain_ms: DEFAULT_RETAIN_MS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            consume_batch_limit: DEFAULT_CONSUME_BATCH_LIMIT,
        }
    }
}

impl Settings {
    /// Load from the optional `agora.toml` in the working directory, then
    /// `AGORA_`-prefixed environment variables, environment winning.
    pub fn load() -> Result<Self, SettingsError> {
        Self::build(None)
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        Self::build(Some(path))
    }

    fn build(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false)),
        };
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        Ok(builder.build()?.try_deserialize()?)
    }
}
