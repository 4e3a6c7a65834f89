//! Cache configuration.
//!
//! Controls the snapshot cache via the `[cache]` section of `portico.toml`:
//!
//! ```toml
//! [cache]
//! enabled = true
//! default_ttl_seconds = 300
//! loader_timeout_ms = 3000
//!
//! [cache.ttl_seconds]
//! water_today = 30
//! services = 3600
//! ```

use std::collections::HashMap;
use std::time::Duration;

use super::module::Module;

/// Loader timeout used when `cache.loader_timeout_ms` is not set.
pub const DEFAULT_LOADER_TIMEOUT_MS: u64 = 3000;

/// Resolved cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When false, every resolve goes to the loader and purges are no-ops.
    pub enabled: bool,
    /// TTL for modules without an explicit override. `None` keeps each module's
    /// built-in window.
    pub default_ttl: Option<Duration>,
    /// Per-module TTL overrides.
    pub ttl_overrides: HashMap<Module, Duration>,
    /// Upper bound the read handlers put on a single loader invocation.
    pub loader_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl: None,
            ttl_overrides: HashMap::new(),
            loader_timeout: Duration::from_millis(DEFAULT_LOADER_TIMEOUT_MS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            default_ttl: settings.default_ttl,
            ttl_overrides: settings.ttl_overrides.clone(),
            loader_timeout: settings.loader_timeout,
        }
    }
}

impl CacheConfig {
    /// Freshness window for `module`: override, then configured default, then
    /// the module's built-in value.
    pub fn ttl(&self, module: Module) -> Duration {
        self.ttl_overrides
            .get(&module)
            .copied()
            .or(self.default_ttl)
            .unwrap_or_else(|| module.default_ttl())
    }

    /// Same TTL for every module. Convenient for scenarios and tests.
    pub fn with_uniform_ttl(ttl: Duration) -> Self {
        Self {
            default_ttl: Some(ttl),
            ..Self::default()
        }
    }

    pub fn with_ttl(mut self, module: Module, ttl: Duration) -> Self {
        self.ttl_overrides.insert(module, ttl);
        self
    }
}
