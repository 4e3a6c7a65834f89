//! Portico content snapshot cache.
//!
//! A per-module read-through cache in front of the relational store:
//!
//! - **Read path** (`resolve`): serve the module's snapshot while fresh;
//!   otherwise rebuild it once per process through the single-flight registry.
//!   When the rebuild fails, serve the last good snapshot or the module's static
//!   fallback, flagged stale. Resolve never fails.
//! - **Write path** (`purge`, `purge_for`): force snapshots stale after a
//!   write. `purge_for` follows the fan-out table so modules that embed the
//!   written data are purged too. Purge failures are logged, counted, and
//!   never reach the caller.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! default_ttl_seconds = 300
//! loader_timeout_ms = 3000
//!
//! [cache.ttl_seconds]
//! water_today = 30
//! ```

mod clock;
mod config;
mod fallback;
mod fanout;
mod flight;
mod invalidator;
mod lock;
pub mod metrics;
mod module;
mod pending;
mod resolver;
mod service;
mod snapshot;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, DEFAULT_LOADER_TIMEOUT_MS};
pub use fallback::{CacheSetupError, FallbackProvider, FallbackRegistry};
pub use fanout::affected_modules;
pub use flight::{FlightRole, RebuildError, RebuildKind, Rebuilt, SingleFlightRegistry};
pub use invalidator::{PurgeOutcome, SnapshotInvalidator};
pub use module::{Module, UnknownModule};
pub use pending::PendingPurges;
pub use resolver::{ResolveSource, Resolved, SnapshotResolver};
pub use service::{ModuleStatus, SnapshotCache};
pub use snapshot::{Snapshot, SnapshotState, checksum_of};
pub use store::{MemorySnapshotStore, SnapshotStore, StoreError};
