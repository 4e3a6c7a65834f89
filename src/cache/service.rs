//! The cache instance handed to read and write handlers.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use time::OffsetDateTime;

use super::clock::Clock;
use super::config::CacheConfig;
use super::fallback::FallbackProvider;
use super::invalidator::{PurgeOutcome, SnapshotInvalidator};
use super::module::Module;
use super::pending::PendingPurges;
use super::resolver::{Resolved, SnapshotResolver};
use super::snapshot::SnapshotState;
use super::store::{SnapshotStore, StoreError};

/// Admin view of one module's snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleStatus {
    pub module: Module,
    pub state: SnapshotState,
    pub checksum: Option<String>,
    pub created_at: Option<OffsetDateTime>,
    pub expires_at: Option<OffsetDateTime>,
}

/// Explicitly constructed; there is no process-wide instance.
pub struct SnapshotCache {
    config: Arc<CacheConfig>,
    store: Arc<dyn SnapshotStore>,
    pending: Arc<PendingPurges>,
    clock: Arc<dyn Clock>,
    resolver: SnapshotResolver,
    invalidator: SnapshotInvalidator,
}

impl SnapshotCache {
    pub fn new(
        config: Arc<CacheConfig>,
        store: Arc<dyn SnapshotStore>,
        fallbacks: Arc<dyn FallbackProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let pending = Arc::new(PendingPurges::new());
        let resolver = SnapshotResolver::new(
            config.clone(),
            store.clone(),
            fallbacks,
            pending.clone(),
            clock.clone(),
        );
        let invalidator = SnapshotInvalidator::new(config.clone(), store.clone(), pending.clone());

        Self {
            config,
            store,
            pending,
            clock,
            resolver,
            invalidator,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub async fn resolve<F, Fut, E>(&self, module: Module, loader: F) -> Resolved
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        self.resolver.resolve(module, loader).await
    }

    pub async fn purge(&self, module: Module) -> PurgeOutcome {
        self.invalidator.purge(module).await
    }

    pub async fn purge_many(&self, modules: &[Module]) -> Vec<(Module, PurgeOutcome)> {
        self.invalidator.purge_many(modules).await
    }

    /// Purge `written` and every module whose payload embeds its data.
    pub async fn purge_for(&self, written: Module) -> Vec<(Module, PurgeOutcome)> {
        self.invalidator.purge_for(written).await
    }

    pub async fn inspect(&self, module: Module) -> Result<ModuleStatus, StoreError> {
        let snapshot = self.store.get(module).await?;

        let state = if self.resolver.flights().is_rebuilding(module) {
            SnapshotState::Rebuilding
        } else {
            match &snapshot {
                None => SnapshotState::Absent,
                Some(_) if self.pending.is_marked(module) => SnapshotState::Stale,
                Some(snapshot) => snapshot.state_at(self.clock.now()),
            }
        };

        Ok(ModuleStatus {
            module,
            state,
            checksum: snapshot.as_ref().map(|s| s.checksum.clone()),
            created_at: snapshot.as_ref().map(|s| s.created_at),
            expires_at: snapshot.as_ref().map(|s| s.expires_at),
        })
    }

    pub async fn inspect_all(&self) -> Result<Vec<ModuleStatus>, StoreError> {
        let mut statuses = Vec::with_capacity(Module::ALL.len());
        for module in Module::ALL {
            statuses.push(self.inspect(module).await?);
        }
        Ok(statuses)
    }
}
