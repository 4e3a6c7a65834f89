//! Snapshot persistence.
//!
//! The store holds at most one snapshot per module. Every mutation is a single
//! atomic upsert or update; same-module rebuilds are serialized a layer up by
//! the single-flight registry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;

use super::clock::Clock;
use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};
use super::module::Module;
use super::snapshot::Snapshot;

const SOURCE: &str = "cache::store";

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("snapshot store unavailable: {0}")]
    Unavailable(String),
    #[error("stored snapshot for `{module}` is unreadable: {message}")]
    Corrupt { module: Module, message: String },
}

impl StoreError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Current snapshot for `module`, fresh or not.
    async fn get(&self, module: Module) -> Result<Option<Snapshot>, StoreError>;

    /// Replace the module's snapshot wholesale. `created_at` is now and
    /// `expires_at` is now plus the module's TTL.
    async fn put(
        &self,
        module: Module,
        payload: Value,
        checksum: String,
    ) -> Result<Snapshot, StoreError>;

    /// Force the module's snapshot to read as stale. Invalidating an absent
    /// module succeeds and leaves it absent.
    async fn invalidate(&self, module: Module) -> Result<(), StoreError>;
}

/// In-process snapshot store.
///
/// Used when no database is configured and throughout the tests.
pub struct MemorySnapshotStore {
    snapshots: RwLock<HashMap<Module, Snapshot>>,
    config: Arc<CacheConfig>,
    clock: Arc<dyn Clock>,
}

impl MemorySnapshotStore {
    pub fn new(config: Arc<CacheConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
            config,
            clock,
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.snapshots, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn get(&self, module: Module) -> Result<Option<Snapshot>, StoreError> {
        Ok(rw_read(&self.snapshots, SOURCE, "get").get(&module).cloned())
    }

    async fn put(
        &self,
        module: Module,
        payload: Value,
        checksum: String,
    ) -> Result<Snapshot, StoreError> {
        let snapshot = Snapshot::stamp(
            module,
            payload,
            checksum,
            self.clock.now(),
            self.config.ttl(module),
        );
        rw_write(&self.snapshots, SOURCE, "put").insert(module, snapshot.clone());
        Ok(snapshot)
    }

    async fn invalidate(&self, module: Module) -> Result<(), StoreError> {
        if let Some(snapshot) = rw_write(&self.snapshots, SOURCE, "invalidate").get_mut(&module) {
            snapshot.expires_at = OffsetDateTime::UNIX_EPOCH;
        }
        Ok(())
    }
}
