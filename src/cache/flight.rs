//! Single-flight rebuild coordination.
//!
//! At most one rebuild per module runs in this process at a time. The first
//! resolve that finds a module stale starts the rebuild on its own task and
//! leaves a shared handle behind; concurrent resolves for the same module await
//! that handle instead of querying the origin again. The handle is removed when
//! the task ends, whatever the outcome, so the next stale read starts over.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use thiserror::Error;

use super::module::Module;
use super::snapshot::Snapshot;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RebuildError {
    #[error("loader failed: {0}")]
    Loader(String),
    #[error("rebuild task aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildKind {
    /// Loaded and written to the store.
    Persisted,
    /// Loaded, but the store rejected the write. Good for the current callers only.
    Unsaved,
    /// The store already held a fresh snapshot when the rebuild began.
    AlreadyFresh,
}

/// A successful rebuild.
#[derive(Debug, Clone)]
pub struct Rebuilt {
    pub snapshot: Snapshot,
    pub kind: RebuildKind,
}

pub type RebuildOutcome = Result<Rebuilt, RebuildError>;

type SharedRebuild = Shared<BoxFuture<'static, RebuildOutcome>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightRole {
    /// Started the rebuild.
    Leader,
    /// Joined a rebuild that was already running.
    Follower,
}

#[derive(Clone, Default)]
pub struct SingleFlightRegistry {
    in_flight: Arc<DashMap<Module, SharedRebuild>>,
}

/// Clears the in-flight marker when the rebuild task finishes or panics.
struct FlightGuard {
    module: Module,
    in_flight: Arc<DashMap<Module, SharedRebuild>>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.in_flight.remove(&self.module);
    }
}

impl SingleFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_rebuilding(&self, module: Module) -> bool {
        self.in_flight.contains_key(&module)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Join the module's running rebuild, or start one with `rebuild`.
    ///
    /// `rebuild` is only invoked by the leader. The rebuild runs on a spawned
    /// task, so a leader whose request is cancelled does not strand followers.
    pub async fn run<F, Fut>(&self, module: Module, rebuild: F) -> (RebuildOutcome, FlightRole)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RebuildOutcome> + Send + 'static,
    {
        let (flight, role) = match self.in_flight.entry(module) {
            Entry::Occupied(existing) => (existing.get().clone(), FlightRole::Follower),
            Entry::Vacant(vacant) => {
                let work = rebuild();
                let in_flight = Arc::clone(&self.in_flight);
                // Spawned on first poll, after the entry lock is released.
                let flight = async move {
                    let guard = FlightGuard { module, in_flight };
                    tokio::spawn(async move {
                        let _guard = guard;
                        work.await
                    })
                    .await
                    .unwrap_or_else(|err| Err(RebuildError::Aborted(err.to_string())))
                }
                .boxed()
                .shared();
                vacant.insert(flight.clone());
                (flight, FlightRole::Leader)
            }
        };

        (flight.await, role)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::json;
    use time::OffsetDateTime;
    use tokio::sync::Notify;

    use super::*;

    fn rebuilt(module: Module) -> Rebuilt {
        Rebuilt {
            snapshot: Snapshot::stamp(
                module,
                json!({ "ok": true }),
                "sum".to_string(),
                OffsetDateTime::UNIX_EPOCH,
                Duration::from_secs(60),
            ),
            kind: RebuildKind::Persisted,
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_rebuild() {
        let registry = SingleFlightRegistry::new();
        let started = Arc::new(AtomicUsize::new(0));
        let release = Arc::new(Notify::new());

        let mut callers = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            let started = Arc::clone(&started);
            let release = Arc::clone(&release);
            callers.push(tokio::spawn(async move {
                registry
                    .run(Module::News, move || async move {
                        started.fetch_add(1, Ordering::SeqCst);
                        release.notified().await;
                        Ok(rebuilt(Module::News))
                    })
                    .await
            }));
        }

        while !registry.is_rebuilding(Module::News) {
            tokio::task::yield_now().await;
        }
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        release.notify_one();

        let mut leaders = 0;
        for caller in callers {
            let (outcome, role) = caller.await.expect("caller task");
            assert!(outcome.is_ok());
            if role == FlightRole::Leader {
                leaders += 1;
            }
        }

        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(leaders, 1);
        assert!(!registry.is_rebuilding(Module::News));
    }

    #[tokio::test]
    async fn marker_is_cleared_after_failure() {
        let registry = SingleFlightRegistry::new();

        let (outcome, role) = registry
            .run(Module::Tenders, || async {
                Err(RebuildError::Loader("origin down".to_string()))
            })
            .await;

        assert_eq!(role, FlightRole::Leader);
        assert_eq!(
            outcome.unwrap_err(),
            RebuildError::Loader("origin down".to_string())
        );
        assert_eq!(registry.in_flight_count(), 0);

        let (outcome, role) = registry
            .run(Module::Tenders, || async { Ok(rebuilt(Module::Tenders)) })
            .await;
        assert_eq!(role, FlightRole::Leader);
        assert!(outcome.is_ok());
    }

    #[tokio::test]
    async fn panicking_rebuild_reports_abort_and_clears_marker() {
        let registry = SingleFlightRegistry::new();

        let (outcome, _) = registry
            .run(Module::Media, || async {
                if loader_should_panic() {
                    panic!("loader blew up");
                }
                Ok(rebuilt(Module::Media))
            })
            .await;

        assert!(matches!(outcome, Err(RebuildError::Aborted(_))));
        assert!(!registry.is_rebuilding(Module::Media));
    }

    #[tokio::test]
    async fn different_modules_rebuild_independently() {
        let registry = SingleFlightRegistry::new();
        let (a, b) = tokio::join!(
            registry.run(Module::Faq, || async { Ok(rebuilt(Module::Faq)) }),
            registry.run(Module::Contact, || async { Ok(rebuilt(Module::Contact)) }),
        );

        assert_eq!(a.1, FlightRole::Leader);
        assert_eq!(b.1, FlightRole::Leader);
        assert_eq!(a.0.expect("faq").snapshot.module, Module::Faq);
        assert_eq!(b.0.expect("contact").snapshot.module, Module::Contact);
    }

    fn loader_should_panic() -> bool {
        true
    }
}
