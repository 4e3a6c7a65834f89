//! Snapshot records.

use std::time::Duration;

use serde_json::Value;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use super::module::Module;

/// The persisted payload for one module, plus the metadata the resolver needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub module: Module,
    pub payload: Value,
    /// SHA-256 of the payload's JSON bytes. Observability only.
    pub checksum: String,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl Snapshot {
    /// Build a snapshot written at `now`, valid for `ttl`.
    pub fn stamp(
        module: Module,
        payload: Value,
        checksum: String,
        now: OffsetDateTime,
        ttl: Duration,
    ) -> Self {
        Self {
            module,
            payload,
            checksum,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Fresh while `now < expires_at`.
    pub fn is_fresh_at(&self, now: OffsetDateTime) -> bool {
        now < self.expires_at
    }

    pub fn state_at(&self, now: OffsetDateTime) -> SnapshotState {
        if self.is_fresh_at(now) {
            SnapshotState::Fresh
        } else {
            SnapshotState::Stale
        }
    }
}

/// Observable per-module state. `Rebuilding` is tracked by the single-flight
/// registry rather than the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotState {
    Absent,
    Fresh,
    Stale,
    Rebuilding,
}

impl SnapshotState {
    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotState::Absent => "absent",
            SnapshotState::Fresh => "fresh",
            SnapshotState::Stale => "stale",
            SnapshotState::Rebuilding => "rebuilding",
        }
    }
}

/// Content fingerprint of a payload.
pub fn checksum_of(payload: &Value) -> String {
    let mut hasher = Sha256::new();
    // Value's Display is compact JSON with keys in map order, which is stable
    // for a given Value.
    hasher.update(payload.to_string().as_bytes());
    hex::encode(hasher.finalize().to_vec())
}
