//! Cache configuration.
//!
//! Staleness windows are tunables, not laws: volatile kinds default to three
//! minutes, slower-moving kinds (announcements, scholarships) and the
//! dashboard to five. Any kind can be overridden individually.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::types::EntityKind;

use super::keys::KeyScope;

const DEFAULT_STALE_MS: u64 = 180_000;
const SETTLED_STALE_MS: u64 = 300_000;
const DEFAULT_DASHBOARD_STALE_MS: u64 = 300_000;
const DEFAULT_RETAIN_MS: u64 = 600_000;
const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60_000;
const DEFAULT_CONSUME_BATCH_LIMIT: usize = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Staleness window for kinds without an explicit override.
    pub default_stale_ms: u64,
    /// Per-kind staleness overrides.
    pub stale_ms: HashMap<EntityKind, u64>,
    /// Staleness window for the dashboard aggregate.
    pub dashboard_stale_ms: u64,
    /// How long an entry with no observers is retained before eviction.
    pub retain_ms: u64,
    /// Cadence of the background eviction sweep.
    pub sweep_interval_ms: u64,
    /// Maximum change events consumed per batch.
    pub consume_batch_limit: usize,
}

impl Default for CacheConfig {
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

impl CacheConfig {
    pub fn stale_for(&self, scope: KeyScope) -> Duration {
        let ms = match scope {
            KeyScope::Entity(kind) => self
                .stale_ms
                .get(&kind)
                .copied()
                .unwrap_or(self.default_stale_ms),
            KeyScope::Dashboard => self.dashboard_stale_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn retain_for(&self) -> Duration {
        Duration::from_millis(self.retain_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            default_stale_ms: settings.default_stale_ms,
            stale_ms: settings.stale_ms.clone(),
            dashboard_stale_ms: settings.dashboard_stale_ms,
            retain_ms: settings.retain_ms,
            sweep_interval_ms: settings.sweep_interval_ms,
            consume_batch_limit: settings.consume_batch_limit,
        }
    }
}
