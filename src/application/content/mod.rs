//! Public content reads.
//!
//! Every public module read goes through [`ContentService::module`], which
//! resolves the module's snapshot with the module's loader bounded by the
//! configured loader timeout.

pub mod fallbacks;
pub mod loaders;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use portico_api_types::{ContentEnvelope, ContentMeta};
use tracing::debug;

use crate::application::repos::{EntriesRepo, SocialLinksRepo};
use crate::cache::{CacheSetupError, Module, SnapshotCache};

use self::loaders::{LoaderError, ModuleLoader, standard_loaders};

#[derive(Clone)]
pub struct ContentService {
    cache: Arc<SnapshotCache>,
    loaders: Arc<HashMap<Module, Arc<dyn ModuleLoader>>>,
    loader_timeout: Duration,
}

impl ContentService {
    /// Fails when any module is left without a loader.
    pub fn new(
        cache: Arc<SnapshotCache>,
        loaders: Vec<Arc<dyn ModuleLoader>>,
    ) -> Result<Self, CacheSetupError> {
        let loaders: HashMap<Module, Arc<dyn ModuleLoader>> = loaders
            .into_iter()
            .map(|loader| (loader.module(), loader))
            .collect();

        let missing: Vec<Module> = Module::ALL
            .into_iter()
            .filter(|module| !loaders.contains_key(module))
            .collect();
        if !missing.is_empty() {
            return Err(CacheSetupError::MissingLoaders(missing));
        }

        let loader_timeout = cache.config().loader_timeout;
        Ok(Self {
            cache,
            loaders: Arc::new(loaders),
            loader_timeout,
        })
    }

    /// Service with the standard loader for every module.
    pub fn standard(
        cache: Arc<SnapshotCache>,
        links: Arc<dyn SocialLinksRepo>,
        entries: Arc<dyn EntriesRepo>,
    ) -> Result<Self, CacheSetupError> {
        Self::new(cache, standard_loaders(links, entries))
    }

    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    pub async fn module(&self, module: Module) -> ContentEnvelope {
        let loader = self.loaders.get(&module).cloned();
        let timeout = self.loader_timeout;

        let resolved = self
            .cache
            .resolve(module, move || async move {
                let Some(loader) = loader else {
                    return Err(LoaderError::Unregistered(module));
                };
                tokio::time::timeout(timeout, loader.load())
                    .await
                    .map_err(|_| LoaderError::Timeout(timeout))?
            })
            .await;

        debug!(
            module = module.as_str(),
            stale = resolved.stale,
            source = resolved.source.as_str(),
            "Content resolved"
        );

        ContentEnvelope {
            data: resolved.data,
            meta: ContentMeta {
                module: module.as_str().to_string(),
                stale: resolved.stale,
                source: resolved.source.as_str().to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::cache::{CacheConfig, ManualClock, MemorySnapshotStore};
    use crate::infra::memory::{InMemoryEntriesRepo, InMemorySocialLinksRepo};

    fn cache(config: CacheConfig) -> Arc<SnapshotCache> {
        let config = Arc::new(config);
        let clock = Arc::new(ManualClock::at_epoch());
        let store = Arc::new(MemorySnapshotStore::new(config.clone(), clock.clone()));
        Arc::new(SnapshotCache::new(
            config,
            store,
            Arc::new(fallbacks::default_fallbacks()),
            clock,
        ))
    }

    #[test]
    fn missing_loader_is_rejected() {
        let links = Arc::new(InMemorySocialLinksRepo::default());
        let loaders = vec![Arc::new(loaders::SocialLinksLoader::new(links)) as Arc<dyn ModuleLoader>];

        let err = ContentService::new(cache(CacheConfig::default()), loaders)
            .err()
            .expect("incomplete loader set must fail");
        match err {
            CacheSetupError::MissingLoaders(missing) => {
                assert_eq!(missing.len(), Module::ALL.len() - 1);
                assert!(!missing.contains(&Module::SocialLinks));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    struct SlowLoader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModuleLoader for SlowLoader {
        fn module(&self) -> Module {
            Module::Projects
        }

        async fn load(&self) -> Result<Value, LoaderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(json!({ "items": ["late"] }))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_loader_times_out_into_fallback() {
        let links = Arc::new(InMemorySocialLinksRepo::default());
        let entries = Arc::new(InMemoryEntriesRepo::default());
        let slow = Arc::new(SlowLoader {
            calls: AtomicUsize::new(0),
        });

        let mut all = standard_loaders(links, entries);
        all.retain(|loader| loader.module() != Module::Projects);
        all.push(slow.clone());

        let config = CacheConfig {
            loader_timeout: Duration::from_millis(50),
            ..CacheConfig::default()
        };
        let service = ContentService::new(cache(config), all).expect("service");

        let envelope = service.module(Module::Projects).await;

        assert!(envelope.meta.stale);
        assert_eq!(envelope.meta.source, "fallback");
        assert_eq!(envelope.data, json!({ "items": [] }));
        assert_eq!(slow.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn envelope_reports_module_and_source() {
        let service = ContentService::standard(
            cache(CacheConfig::default()),
            Arc::new(InMemorySocialLinksRepo::default()),
            Arc::new(InMemoryEntriesRepo::default()),
        )
        .expect("service");

        let envelope = service.module(Module::Faq).await;
        assert_eq!(envelope.meta.module, "faq");
        assert_eq!(envelope.meta.source, "rebuilt");
        assert!(!envelope.meta.stale);

        let again = service.module(Module::Faq).await;
        assert_eq!(again.meta.source, "hit");
    }
}
