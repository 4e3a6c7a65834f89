//! Read path.
//!
//! `resolve` never fails. In order of preference it returns a fresh snapshot,
//! a freshly rebuilt payload, the last good snapshot flagged stale, or the
//! module's static fallback flagged stale.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::clock::Clock;
use super::config::CacheConfig;
use super::fallback::FallbackProvider;
use super::flight::{
    FlightRole, RebuildError, RebuildKind, RebuildOutcome, Rebuilt, SingleFlightRegistry,
};
use super::metrics::{
    METRIC_CACHE_FALLBACK_SERVED, METRIC_CACHE_HIT, METRIC_CACHE_MISS, METRIC_CACHE_REBUILD,
    METRIC_CACHE_REBUILD_FAILED, METRIC_CACHE_REBUILD_MS, METRIC_CACHE_STALE_SERVED,
    METRIC_CACHE_STORE_ERROR,
};
use super::module::Module;
use super::pending::{Epoch, PendingPurges};
use super::snapshot::{Snapshot, checksum_of};
use super::store::{SnapshotStore, StoreError};

/// Where a resolved payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveSource {
    /// Fresh snapshot from the store.
    Hit,
    /// Loaded and persisted during this resolve.
    Rebuilt,
    /// Loaded, but not persisted (store unavailable or cache disabled).
    Uncached,
    /// Loader failed; last good snapshot served.
    StaleSnapshot,
    /// Loader failed with nothing stored; static default served.
    Fallback,
    /// Loader failed with no snapshot and no fallback registered.
    Missing,
}

impl ResolveSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolveSource::Hit => "hit",
            ResolveSource::Rebuilt => "rebuilt",
            ResolveSource::Uncached => "uncached",
            ResolveSource::StaleSnapshot => "stale_snapshot",
            ResolveSource::Fallback => "fallback",
            ResolveSource::Missing => "missing",
        }
    }
}

impl fmt::Display for ResolveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub data: Value,
    pub stale: bool,
    pub source: ResolveSource,
}

impl Resolved {
    fn fresh(data: Value, source: ResolveSource) -> Self {
        Self {
            data,
            stale: false,
            source,
        }
    }

    fn stale(data: Value, source: ResolveSource) -> Self {
        Self {
            data,
            stale: true,
            source,
        }
    }
}

pub struct SnapshotResolver {
    config: Arc<CacheConfig>,
    store: Arc<dyn SnapshotStore>,
    fallbacks: Arc<dyn FallbackProvider>,
    pending: Arc<PendingPurges>,
    clock: Arc<dyn Clock>,
    flights: SingleFlightRegistry,
}

impl SnapshotResolver {
    pub fn new(
        config: Arc<CacheConfig>,
        store: Arc<dyn SnapshotStore>,
        fallbacks: Arc<dyn FallbackProvider>,
        pending: Arc<PendingPurges>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            fallbacks,
            pending,
            clock,
            flights: SingleFlightRegistry::new(),
        }
    }

    pub fn flights(&self) -> &SingleFlightRegistry {
        &self.flights
    }

    /// Resolve `module`, calling `loader` only when the stored snapshot is
    /// absent, expired, or purged. Loader errors (timeouts included) are
    /// absorbed here.
    pub async fn resolve<F, Fut, E>(&self, module: Module, loader: F) -> Resolved
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        if !self.config.enabled {
            return self.passthrough(module, loader()).await;
        }

        let current = match self.store.get(module).await {
            Ok(current) => current,
            Err(err) => {
                record_store_error(module, "get", &err);
                return self.passthrough(module, loader()).await;
            }
        };

        if let Some(snapshot) = &current
            && snapshot.is_fresh_at(self.clock.now())
            && !self.pending.is_marked(module)
        {
            counter!(METRIC_CACHE_HIT, "module" => module.as_str()).increment(1);
            debug!(module = module.as_str(), "Snapshot cache hit");
            return Resolved::fresh(snapshot.payload.clone(), ResolveSource::Hit);
        }

        counter!(METRIC_CACHE_MISS, "module" => module.as_str()).increment(1);
        debug!(
            module = module.as_str(),
            present = current.is_some(),
            "Snapshot cache miss"
        );

        let started = self.pending.current_epoch();
        let (outcome, role) = self
            .flights
            .run(module, || self.rebuild(module, loader(), started))
            .await;

        match outcome {
            Ok(rebuilt) => Self::served_rebuild(rebuilt),
            Err(err) => {
                if role == FlightRole::Leader {
                    counter!(METRIC_CACHE_REBUILD_FAILED, "module" => module.as_str())
                        .increment(1);
                    warn!(module = module.as_str(), error = %err, "Snapshot rebuild failed");
                }
                match current {
                    Some(snapshot) => {
                        counter!(METRIC_CACHE_STALE_SERVED, "module" => module.as_str())
                            .increment(1);
                        Resolved::stale(snapshot.payload, ResolveSource::StaleSnapshot)
                    }
                    None => self.fallback(module),
                }
            }
        }
    }

    fn served_rebuild(rebuilt: Rebuilt) -> Resolved {
        let source = match rebuilt.kind {
            RebuildKind::Persisted => ResolveSource::Rebuilt,
            RebuildKind::Unsaved => ResolveSource::Uncached,
            RebuildKind::AlreadyFresh => ResolveSource::Hit,
        };
        Resolved::fresh(rebuilt.snapshot.payload, source)
    }

    /// The leader's rebuild. Runs detached from the request that started it.
    fn rebuild<Fut, E>(
        &self,
        module: Module,
        load: Fut,
        started: Epoch,
    ) -> impl Future<Output = RebuildOutcome> + Send + use<Fut, E>
    where
        Fut: Future<Output = Result<Value, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let config = Arc::clone(&self.config);
        let store = Arc::clone(&self.store);
        let pending = Arc::clone(&self.pending);
        let clock = Arc::clone(&self.clock);

        async move {
            // A flight that finished between our read and taking leadership
            // may already have written a fresh snapshot.
            if let Ok(Some(snapshot)) = store.get(module).await
                && snapshot.is_fresh_at(clock.now())
                && !pending.is_marked(module)
            {
                return Ok(Rebuilt {
                    snapshot,
                    kind: RebuildKind::AlreadyFresh,
                });
            }

            let load_started_at = Instant::now();
            let payload = load
                .await
                .map_err(|err| RebuildError::Loader(err.to_string()))?;
            let checksum = checksum_of(&payload);

            let rebuilt = match store.put(module, payload.clone(), checksum.clone()).await {
                Ok(snapshot) => {
                    pending.clear_if_older(module, started);
                    info!(
                        module = module.as_str(),
                        checksum = %snapshot.checksum,
                        expires_at = %snapshot.expires_at,
                        "Snapshot rebuilt"
                    );
                    Rebuilt {
                        snapshot,
                        kind: RebuildKind::Persisted,
                    }
                }
                Err(err) => {
                    record_store_error(module, "put", &err);
                    Rebuilt {
                        snapshot: Snapshot::stamp(
                            module,
                            payload,
                            checksum,
                            clock.now(),
                            config.ttl(module),
                        ),
                        kind: RebuildKind::Unsaved,
                    }
                }
            };

            counter!(METRIC_CACHE_REBUILD, "module" => module.as_str()).increment(1);
            histogram!(METRIC_CACHE_REBUILD_MS, "module" => module.as_str())
                .record(load_started_at.elapsed().as_secs_f64() * 1000.0);

            Ok(rebuilt)
        }
    }

    /// Uncoordinated load, used when the cache is disabled or the store cannot
    /// be read.
    async fn passthrough<Fut, E>(&self, module: Module, load: Fut) -> Resolved
    where
        Fut: Future<Output = Result<Value, E>>,
        E: fmt::Display,
    {
        match load.await {
            Ok(payload) => Resolved::fresh(payload, ResolveSource::Uncached),
            Err(err) => {
                counter!(METRIC_CACHE_REBUILD_FAILED, "module" => module.as_str()).increment(1);
                warn!(module = module.as_str(), error = %err, "Uncached load failed");
                self.fallback(module)
            }
        }
    }

    fn fallback(&self, module: Module) -> Resolved {
        match self.fallbacks.fallback(module) {
            Some(payload) => {
                counter!(METRIC_CACHE_FALLBACK_SERVED, "module" => module.as_str()).increment(1);
                warn!(module = module.as_str(), "Serving static fallback");
                Resolved::stale(payload, ResolveSource::Fallback)
            }
            None => {
                error!(
                    module = module.as_str(),
                    "No snapshot, loader, or fallback available"
                );
                Resolved::stale(Value::Null, ResolveSource::Missing)
            }
        }
    }
}

pub(crate) fn record_store_error(module: Module, op: &'static str, err: &StoreError) {
    counter!(METRIC_CACHE_STORE_ERROR, "module" => module.as_str(), "op" => op).increment(1);
    warn!(module = module.as_str(), op, error = %err, "Snapshot store error");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Notify;

    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::cache::fallback::FallbackRegistry;
    use crate::cache::invalidator::SnapshotInvalidator;
    use crate::cache::store::MemorySnapshotStore;

    struct Harness {
        resolver: SnapshotResolver,
        store: Arc<MemorySnapshotStore>,
        clock: Arc<ManualClock>,
        pending: Arc<PendingPurges>,
    }

    fn harness(ttl: u64) -> Harness {
        let clock = Arc::new(ManualClock::at_epoch());
        let config = Arc::new(CacheConfig::with_uniform_ttl(Duration::from_secs(ttl)));
        let store = Arc::new(MemorySnapshotStore::new(config.clone(), clock.clone()));
        let fallbacks =
            Arc::new(FallbackRegistry::new().register(Module::Faq, json!({ "items": ["default"] })));
        let pending = Arc::new(PendingPurges::new());
        let resolver = SnapshotResolver::new(
            config,
            store.clone(),
            fallbacks,
            pending.clone(),
            clock.clone(),
        );
        Harness {
            resolver,
            store,
            clock,
            pending,
        }
    }

    fn counting_loader(
        calls: &Arc<AtomicUsize>,
        payload: Value,
    ) -> impl FnOnce() -> futures::future::Ready<Result<Value, String>> {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(Ok(payload))
        }
    }

    fn failing_loader() -> impl FnOnce() -> futures::future::Ready<Result<Value, String>> {
        || futures::future::ready(Err("origin unavailable".to_string()))
    }

    #[tokio::test]
    async fn fresh_snapshot_is_served_without_loader() {
        let h = harness(60);
        let calls = Arc::new(AtomicUsize::new(0));

        let first = h
            .resolver
            .resolve(Module::Faq, counting_loader(&calls, json!(["q1"])))
            .await;
        assert_eq!(first.source, ResolveSource::Rebuilt);

        h.clock.advance(Duration::from_secs(30));
        let second = h
            .resolver
            .resolve(Module::Faq, counting_loader(&calls, json!(["q2"])))
            .await;

        assert_eq!(second.data, json!(["q1"]));
        assert!(!second.stale);
        assert_eq!(second.source, ResolveSource::Hit);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_payload_counts_as_success() {
        let h = harness(60);
        let calls = Arc::new(AtomicUsize::new(0));

        let resolved = h
            .resolver
            .resolve(Module::Tenders, counting_loader(&calls, json!([])))
            .await;
        assert_eq!(resolved.data, json!([]));
        assert!(!resolved.stale);

        let again = h
            .resolver
            .resolve(Module::Tenders, counting_loader(&calls, json!(["x"])))
            .await;
        assert_eq!(again.data, json!([]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_rebuild_serves_old_snapshot_and_keeps_timestamps() {
        let h = harness(60);
        let calls = Arc::new(AtomicUsize::new(0));
        h.resolver
            .resolve(Module::News, counting_loader(&calls, json!({ "items": [1] })))
            .await;
        let before = h.store.get(Module::News).await.expect("get").expect("present");

        h.clock.advance(Duration::from_secs(61));
        let resolved = h.resolver.resolve(Module::News, failing_loader()).await;

        assert_eq!(resolved.data, json!({ "items": [1] }));
        assert!(resolved.stale);
        assert_eq!(resolved.source, ResolveSource::StaleSnapshot);

        let after = h.store.get(Module::News).await.expect("get").expect("present");
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn cold_failure_serves_fallback_without_persisting() {
        let h = harness(60);

        let resolved = h.resolver.resolve(Module::Faq, failing_loader()).await;

        assert_eq!(resolved.data, json!({ "items": ["default"] }));
        assert!(resolved.stale);
        assert_eq!(resolved.source, ResolveSource::Fallback);
        assert!(h.store.get(Module::Faq).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn missing_fallback_yields_null() {
        let h = harness(60);

        let resolved = h.resolver.resolve(Module::Careers, failing_loader()).await;

        assert_eq!(resolved.data, Value::Null);
        assert!(resolved.stale);
        assert_eq!(resolved.source, ResolveSource::Missing);
    }

    #[tokio::test]
    async fn pending_mark_forces_rebuild_and_is_cleared() {
        let h = harness(600);
        let calls = Arc::new(AtomicUsize::new(0));
        h.resolver
            .resolve(Module::Home, counting_loader(&calls, json!({ "v": 1 })))
            .await;

        h.pending.mark(Module::Home);
        let resolved = h
            .resolver
            .resolve(Module::Home, counting_loader(&calls, json!({ "v": 2 })))
            .await;

        assert_eq!(resolved.data, json!({ "v": 2 }));
        assert_eq!(resolved.source, ResolveSource::Rebuilt);
        assert!(!h.pending.is_marked(Module::Home));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn purge_during_rebuild_forces_another_rebuild() {
        let h = harness(600);
        let invalidator = SnapshotInvalidator::new(
            Arc::new(CacheConfig::with_uniform_ttl(Duration::from_secs(600))),
            h.store.clone(),
            h.pending.clone(),
        );
        let loading = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());

        let loader = {
            let loading = Arc::clone(&loading);
            let release = Arc::clone(&release);
            move || async move {
                loading.notify_one();
                release.notified().await;
                Ok::<_, String>(json!({ "links": ["pre-write"] }))
            }
        };
        let (first, ()) = tokio::join!(h.resolver.resolve(Module::SocialLinks, loader), async {
            loading.notified().await;
            invalidator.purge_for(Module::SocialLinks).await;
            release.notify_one();
        });
        assert_eq!(first.data, json!({ "links": ["pre-write"] }));
        assert!(h.pending.is_marked(Module::SocialLinks));

        let calls = Arc::new(AtomicUsize::new(0));
        let next = h
            .resolver
            .resolve(
                Module::SocialLinks,
                counting_loader(&calls, json!({ "links": ["post-write"] })),
            )
            .await;

        assert_eq!(next.source, ResolveSource::Rebuilt);
        assert_eq!(next.data, json!({ "links": ["post-write"] }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!h.pending.is_marked(Module::SocialLinks));
    }

    struct BrokenStore;

    #[async_trait]
    impl SnapshotStore for BrokenStore {
        async fn get(&self, _module: Module) -> Result<Option<Snapshot>, StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        async fn put(
            &self,
            _module: Module,
            _payload: Value,
            _checksum: String,
        ) -> Result<Snapshot, StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        async fn invalidate(&self, _module: Module) -> Result<(), StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }
    }

    fn broken_resolver() -> SnapshotResolver {
        SnapshotResolver::new(
            Arc::new(CacheConfig::default()),
            Arc::new(BrokenStore),
            Arc::new(FallbackRegistry::new().register(Module::Media, json!({ "albums": [] }))),
            Arc::new(PendingPurges::new()),
            Arc::new(ManualClock::at_epoch()),
        )
    }

    #[tokio::test]
    async fn unavailable_store_returns_loader_result_uncached() {
        let resolver = broken_resolver();
        let calls = Arc::new(AtomicUsize::new(0));

        let resolved = resolver
            .resolve(Module::Media, counting_loader(&calls, json!({ "albums": ["a"] })))
            .await;

        assert_eq!(resolved.data, json!({ "albums": ["a"] }));
        assert!(!resolved.stale);
        assert_eq!(resolved.source, ResolveSource::Uncached);
    }

    #[tokio::test]
    async fn unavailable_store_and_failed_loader_serves_fallback() {
        let resolver = broken_resolver();

        let resolved = resolver.resolve(Module::Media, failing_loader()).await;

        assert_eq!(resolved.data, json!({ "albums": [] }));
        assert!(resolved.stale);
        assert_eq!(resolved.source, ResolveSource::Fallback);
    }

    #[tokio::test]
    async fn disabled_cache_always_loads() {
        let clock = Arc::new(ManualClock::at_epoch());
        let config = Arc::new(CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        });
        let store = Arc::new(MemorySnapshotStore::new(config.clone(), clock.clone()));
        let resolver = SnapshotResolver::new(
            config,
            store.clone(),
            Arc::new(FallbackRegistry::new()),
            Arc::new(PendingPurges::new()),
            clock,
        );
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let resolved = resolver
                .resolve(Module::Projects, counting_loader(&calls, json!([])))
                .await;
            assert_eq!(resolved.source, ResolveSource::Uncached);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(store.is_empty());
    }
}
