//! Per-module loaders.
//!
//! A loader re-queries the origin store and builds the full payload for one
//! module. Loaders that embed another module's rows declare it in `embeds`,
//! and the fan-out table must purge them whenever that module is written.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use thiserror::Error;
use time::format_description::well_known::Rfc3339;

use crate::application::repos::{EntriesRepo, RepoError, SocialLinksRepo};
use crate::cache::Module;
use crate::domain::entities::{ContentEntryRecord, SocialLinkRecord};

const HOME_SERVICES_LIMIT: u32 = 6;
const HOME_LEADERSHIP_LIMIT: u32 = 4;
const HOME_NEWS_LIMIT: u32 = 3;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("loader timed out after {0:?}")]
    Timeout(Duration),
    #[error("no loader registered for `{0}`")]
    Unregistered(Module),
}

#[async_trait]
pub trait ModuleLoader: Send + Sync {
    fn module(&self) -> Module;

    /// Other modules whose data appears in this payload.
    fn embeds(&self) -> &'static [Module] {
        &[]
    }

    async fn load(&self) -> Result<Value, LoaderError>;
}

pub struct SocialLinksLoader {
    links: Arc<dyn SocialLinksRepo>,
}

impl SocialLinksLoader {
    pub fn new(links: Arc<dyn SocialLinksRepo>) -> Self {
        Self { links }
    }
}

#[async_trait]
impl ModuleLoader for SocialLinksLoader {
    fn module(&self) -> Module {
        Module::SocialLinks
    }

    async fn load(&self) -> Result<Value, LoaderError> {
        let links = self.links.list_visible().await?;
        Ok(json!({ "links": links.iter().map(link_json).collect::<Vec<_>>() }))
    }
}

/// Loader for modules whose payload is a plain list of published entries.
pub struct EntriesLoader {
    module: Module,
    entries: Arc<dyn EntriesRepo>,
}

impl EntriesLoader {
    pub fn new(module: Module, entries: Arc<dyn EntriesRepo>) -> Self {
        Self { module, entries }
    }
}

#[async_trait]
impl ModuleLoader for EntriesLoader {
    fn module(&self) -> Module {
        self.module
    }

    async fn load(&self) -> Result<Value, LoaderError> {
        let items = self.entries.list_published(self.module, None).await?;
        Ok(json!({ "items": entries_json(&items) }))
    }
}

/// Contact page: contact entries plus the office locations.
pub struct ContactLoader {
    entries: Arc<dyn EntriesRepo>,
}

impl ContactLoader {
    pub fn new(entries: Arc<dyn EntriesRepo>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl ModuleLoader for ContactLoader {
    fn module(&self) -> Module {
        Module::Contact
    }

    fn embeds(&self) -> &'static [Module] {
        &[Module::Locations]
    }

    async fn load(&self) -> Result<Value, LoaderError> {
        let (contact, locations) = tokio::try_join!(
            self.entries.list_published(Module::Contact, None),
            self.entries.list_published(Module::Locations, None),
        )?;
        Ok(json!({
            "items": entries_json(&contact),
            "locations": entries_json(&locations),
        }))
    }
}

/// Landing page, assembled from several modules' data.
pub struct HomeLoader {
    links: Arc<dyn SocialLinksRepo>,
    entries: Arc<dyn EntriesRepo>,
}

impl HomeLoader {
    pub fn new(links: Arc<dyn SocialLinksRepo>, entries: Arc<dyn EntriesRepo>) -> Self {
        Self { links, entries }
    }
}

#[async_trait]
impl ModuleLoader for HomeLoader {
    fn module(&self) -> Module {
        Module::Home
    }

    fn embeds(&self) -> &'static [Module] {
        &[
            Module::SocialLinks,
            Module::Services,
            Module::Leadership,
            Module::News,
            Module::WaterToday,
        ]
    }

    async fn load(&self) -> Result<Value, LoaderError> {
        let (links, services, leadership, news, water) = tokio::try_join!(
            self.links.list_visible(),
            self.entries
                .list_published(Module::Services, Some(HOME_SERVICES_LIMIT)),
            self.entries
                .list_published(Module::Leadership, Some(HOME_LEADERSHIP_LIMIT)),
            self.entries.list_published(Module::News, Some(HOME_NEWS_LIMIT)),
            self.entries.list_published(Module::WaterToday, Some(1)),
        )?;

        Ok(json!({
            "services": entries_json(&services),
            "leadership": entries_json(&leadership),
            "latest_news": entries_json(&news),
            "water_today": water.first().map(entry_json).unwrap_or(Value::Null),
            "social_links": links.iter().map(link_json).collect::<Vec<_>>(),
        }))
    }
}

/// One loader per module, wired to the given repositories.
pub fn standard_loaders(
    links: Arc<dyn SocialLinksRepo>,
    entries: Arc<dyn EntriesRepo>,
) -> Vec<Arc<dyn ModuleLoader>> {
    Module::ALL
        .into_iter()
        .map(|module| -> Arc<dyn ModuleLoader> {
            match module {
                Module::Home => Arc::new(HomeLoader::new(links.clone(), entries.clone())),
                Module::SocialLinks => Arc::new(SocialLinksLoader::new(links.clone())),
                Module::Contact => Arc::new(ContactLoader::new(entries.clone())),
                other => Arc::new(EntriesLoader::new(other, entries.clone())),
            }
        })
        .collect()
}

fn link_json(link: &SocialLinkRecord) -> Value {
    json!({
        "platform": link.platform,
        "url": link.url,
    })
}

fn entry_json(entry: &ContentEntryRecord) -> Value {
    json!({
        "id": entry.id,
        "title": entry.title,
        "body": entry.body,
        "position": entry.position,
        "updated_at": entry.updated_at.format(&Rfc3339).ok(),
    })
}

fn entries_json(entries: &[ContentEntryRecord]) -> Vec<Value> {
    entries.iter().map(entry_json).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::repos::{CreateEntryParams, CreateSocialLinkParams};
    use crate::cache::affected_modules;
    use crate::infra::memory::{InMemoryEntriesRepo, InMemorySocialLinksRepo};

    fn repos() -> (Arc<InMemorySocialLinksRepo>, Arc<InMemoryEntriesRepo>) {
        (
            Arc::new(InMemorySocialLinksRepo::default()),
            Arc::new(InMemoryEntriesRepo::default()),
        )
    }

    #[test]
    fn fanout_table_covers_every_embedded_module() {
        let (links, entries) = repos();
        for loader in standard_loaders(links, entries) {
            for embedded in loader.embeds() {
                assert!(
                    affected_modules(*embedded).contains(&loader.module()),
                    "writes to {embedded} must purge {}",
                    loader.module()
                );
            }
        }
    }

    #[test]
    fn standard_loaders_cover_every_module_once() {
        let (links, entries) = repos();
        let modules: Vec<Module> = standard_loaders(links, entries)
            .iter()
            .map(|loader| loader.module())
            .collect();
        assert_eq!(modules, Module::ALL.to_vec());
    }

    #[tokio::test]
    async fn social_links_loader_lists_visible_links_only() {
        let (links, _entries) = repos();
        links
            .create(CreateSocialLinkParams {
                platform: "facebook".into(),
                url: "https://facebook.com/water".into(),
                sort_order: 1,
                visible: true,
            })
            .await
            .expect("create");
        links
            .create(CreateSocialLinkParams {
                platform: "x".into(),
                url: "https://x.com/water".into(),
                sort_order: 2,
                visible: false,
            })
            .await
            .expect("create");

        let payload = SocialLinksLoader::new(links).load().await.expect("load");
        assert_eq!(
            payload,
            json!({ "links": [{ "platform": "facebook", "url": "https://facebook.com/water" }] })
        );
    }

    #[tokio::test]
    async fn home_loader_embeds_other_modules() {
        let (links, entries) = repos();
        links
            .create(CreateSocialLinkParams {
                platform: "youtube".into(),
                url: "https://youtube.com/@water".into(),
                sort_order: 0,
                visible: true,
            })
            .await
            .expect("create link");
        for (module, title) in [
            (Module::Services, "Billing"),
            (Module::News, "New reservoir"),
            (Module::WaterToday, "Level 82%"),
            (Module::Tenders, "Pipe supply"),
        ] {
            entries
                .create(CreateEntryParams {
                    module,
                    title: title.into(),
                    body: json!({}),
                    position: 0,
                    published: true,
                })
                .await
                .expect("create entry");
        }

        let payload = HomeLoader::new(links, entries).load().await.expect("load");

        assert_eq!(payload["services"][0]["title"], "Billing");
        assert_eq!(payload["latest_news"][0]["title"], "New reservoir");
        assert_eq!(payload["water_today"]["title"], "Level 82%");
        assert_eq!(payload["social_links"][0]["platform"], "youtube");
        assert_eq!(payload["leadership"], json!([]));
        assert!(payload.get("tenders").is_none());
    }

    #[tokio::test]
    async fn empty_module_loads_empty_list() {
        let (_links, entries) = repos();
        let payload = EntriesLoader::new(Module::Careers, entries)
            .load()
            .await
            .expect("load");
        assert_eq!(payload, json!({ "items": [] }));
    }
}
