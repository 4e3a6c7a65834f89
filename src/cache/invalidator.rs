//! Write path.
//!
//! Purges are best-effort: the caller never sees a failure. Every purge is
//! also recorded in [`PendingPurges`], so this process rebuilds the module on
//! its next resolve even when the store write failed or a rebuild that began
//! before the purge has since written an older payload.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use super::config::CacheConfig;
use super::fanout::affected_modules;
use super::metrics::{METRIC_CACHE_PURGE, METRIC_CACHE_PURGE_FAILED};
use super::module::Module;
use super::pending::PendingPurges;
use super::store::SnapshotStore;

/// Outcome of a single purge, for callers that report it (admin, CLI).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeOutcome {
    Purged,
    /// The store rejected the purge; only the in-process mark took effect.
    Deferred,
    /// Cache disabled.
    Skipped,
}

pub struct SnapshotInvalidator {
    config: Arc<CacheConfig>,
    store: Arc<dyn SnapshotStore>,
    pending: Arc<PendingPurges>,
}

impl SnapshotInvalidator {
    pub fn new(
        config: Arc<CacheConfig>,
        store: Arc<dyn SnapshotStore>,
        pending: Arc<PendingPurges>,
    ) -> Self {
        Self {
            config,
            store,
            pending,
        }
    }

    pub async fn purge(&self, module: Module) -> PurgeOutcome {
        if !self.config.enabled {
            return PurgeOutcome::Skipped;
        }

        // Marked before the store write, so a rebuild already reading the
        // origin cannot leave its older payload looking fresh.
        let epoch = self.pending.mark(module);
        match self.store.invalidate(module).await {
            Ok(()) => {
                counter!(METRIC_CACHE_PURGE, "module" => module.as_str()).increment(1);
                debug!(module = module.as_str(), epoch, "Snapshot purged");
                PurgeOutcome::Purged
            }
            Err(err) => {
                counter!(METRIC_CACHE_PURGE_FAILED, "module" => module.as_str()).increment(1);
                warn!(
                    module = module.as_str(),
                    epoch,
                    error = %err,
                    "Snapshot purge failed; marked pending"
                );
                PurgeOutcome::Deferred
            }
        }
    }

    pub async fn purge_many(&self, modules: &[Module]) -> Vec<(Module, PurgeOutcome)> {
        let mut outcomes = Vec::with_capacity(modules.len());
        for module in modules {
            outcomes.push((*module, self.purge(*module).await));
        }
        outcomes
    }

    /// Purge everything a write to `written` makes stale.
    pub async fn purge_for(&self, written: Module) -> Vec<(Module, PurgeOutcome)> {
        self.purge_many(affected_modules(written)).await
    }
}
