//! In-process repositories for running without a database.
//!
//! Contents are lost on restart. `set_failing` makes every call return a
//! persistence error, which is how origin outages are exercised in tests.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreateEntryParams, CreateSocialLinkParams, EntriesRepo, RepoError, SocialLinksRepo,
    UpdateEntryParams, UpdateSocialLinkParams,
};
use crate::cache::Module;
use crate::domain::entities::{ContentEntryRecord, SocialLinkRecord};

fn read<T>(lock: &RwLock<T>) -> Result<std::sync::RwLockReadGuard<'_, T>, RepoError> {
    lock.read()
        .map_err(|_| RepoError::from_persistence("in-memory repository lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<std::sync::RwLockWriteGuard<'_, T>, RepoError> {
    lock.write()
        .map_err(|_| RepoError::from_persistence("in-memory repository lock poisoned"))
}

#[derive(Default)]
struct Outage(AtomicBool);

impl Outage {
    fn check(&self) -> Result<(), RepoError> {
        if self.0.load(Ordering::SeqCst) {
            Err(RepoError::from_persistence("origin store unavailable"))
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
pub struct InMemorySocialLinksRepo {
    links: RwLock<HashMap<Uuid, SocialLinkRecord>>,
    outage: Outage,
}

impl InMemorySocialLinksRepo {
    pub fn set_failing(&self, failing: bool) {
        self.outage.0.store(failing, Ordering::SeqCst);
    }

    fn sorted(&self, visible_only: bool) -> Result<Vec<SocialLinkRecord>, RepoError> {
        self.outage.check()?;
        let mut links: Vec<SocialLinkRecord> = read(&self.links)?
            .values()
            .filter(|link| !visible_only || link.visible)
            .cloned()
            .collect();
        links.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.platform.cmp(&b.platform))
        });
        Ok(links)
    }

    fn ensure_unique_platform(
        links: &HashMap<Uuid, SocialLinkRecord>,
        platform: &str,
        except: Option<Uuid>,
    ) -> Result<(), RepoError> {
        if links
            .values()
            .any(|link| link.platform == platform && Some(link.id) != except)
        {
            return Err(RepoError::Duplicate {
                constraint: "social_links_platform_key".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SocialLinksRepo for InMemorySocialLinksRepo {
    async fn list_visible(&self) -> Result<Vec<SocialLinkRecord>, RepoError> {
        self.sorted(true)
    }

    async fn list_all(&self) -> Result<Vec<SocialLinkRecord>, RepoError> {
        self.sorted(false)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SocialLinkRecord>, RepoError> {
        self.outage.check()?;
        Ok(read(&self.links)?.get(&id).cloned())
    }

    async fn create(&self, params: CreateSocialLinkParams) -> Result<SocialLinkRecord, RepoError> {
        self.outage.check()?;
        let mut links = write(&self.links)?;
        Self::ensure_unique_platform(&links, &params.platform, None)?;

        let now = OffsetDateTime::now_utc();
        let link = SocialLinkRecord {
            id: Uuid::new_v4(),
            platform: params.platform,
            url: params.url,
            sort_order: params.sort_order,
            visible: params.visible,
            created_at: now,
            updated_at: now,
        };
        links.insert(link.id, link.clone());
        Ok(link)
    }

    async fn update(&self, params: UpdateSocialLinkParams) -> Result<SocialLinkRecord, RepoError> {
        self.outage.check()?;
        let mut links = write(&self.links)?;
        Self::ensure_unique_platform(&links, &params.platform, Some(params.id))?;

        let link = links.get_mut(&params.id).ok_or(RepoError::NotFound)?;
        link.platform = params.platform;
        link.url = params.url;
        link.sort_order = params.sort_order;
        link.visible = params.visible;
        link.updated_at = OffsetDateTime::now_utc();
        Ok(link.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<SocialLinkRecord, RepoError> {
        self.outage.check()?;
        write(&self.links)?.remove(&id).ok_or(RepoError::NotFound)
    }
}

#[derive(Default)]
pub struct InMemoryEntriesRepo {
    entries: RwLock<HashMap<Uuid, ContentEntryRecord>>,
    outage: Outage,
}

impl InMemoryEntriesRepo {
    pub fn set_failing(&self, failing: bool) {
        self.outage.0.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EntriesRepo for InMemoryEntriesRepo {
    async fn list_published(
        &self,
        module: Module,
        limit: Option<u32>,
    ) -> Result<Vec<ContentEntryRecord>, RepoError> {
        self.outage.check()?;
        let mut items: Vec<ContentEntryRecord> = read(&self.entries)?
            .values()
            .filter(|entry| entry.module == module && entry.published)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        if let Some(limit) = limit {
            items.truncate(limit as usize);
        }
        Ok(items)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentEntryRecord>, RepoError> {
        self.outage.check()?;
        Ok(read(&self.entries)?.get(&id).cloned())
    }

    async fn create(&self, params: CreateEntryParams) -> Result<ContentEntryRecord, RepoError> {
        self.outage.check()?;
        let now = OffsetDateTime::now_utc();
        let entry = ContentEntryRecord {
            id: Uuid::new_v4(),
            module: params.module,
            title: params.title,
            body: params.body,
            position: params.position,
            published: params.published,
            created_at: now,
            updated_at: now,
        };
        write(&self.entries)?.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn update(&self, params: UpdateEntryParams) -> Result<ContentEntryRecord, RepoError> {
        self.outage.check()?;
        let mut entries = write(&self.entries)?;
        let entry = entries.get_mut(&params.id).ok_or(RepoError::NotFound)?;
        entry.title = params.title;
        entry.body = params.body;
        entry.position = params.position;
        entry.published = params.published;
        entry.updated_at = OffsetDateTime::now_utc();
        Ok(entry.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<ContentEntryRecord, RepoError> {
        self.outage.check()?;
        write(&self.entries)?.remove(&id).ok_or(RepoError::NotFound)
    }
}
