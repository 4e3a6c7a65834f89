use std::sync::Arc;

use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::AdminWriteError;
use crate::application::repos::{CreateEntryParams, EntriesRepo, RepoError, UpdateEntryParams};
use crate::cache::{Module, SnapshotCache};
use crate::domain::entities::ContentEntryRecord;
use crate::domain::entries::{ensure_entry_backed, normalize_title};

#[derive(Debug, Clone)]
pub struct CreateEntryCommand {
    pub title: String,
    pub body: Value,
    pub position: i32,
    pub published: bool,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateEntryCommand {
    pub title: Option<String>,
    pub body: Option<Value>,
    pub position: Option<i32>,
    pub published: Option<bool>,
}

#[derive(Clone)]
pub struct EntryService {
    repo: Arc<dyn EntriesRepo>,
    cache: Arc<SnapshotCache>,
}

impl EntryService {
    pub fn new(repo: Arc<dyn EntriesRepo>, cache: Arc<SnapshotCache>) -> Self {
        Self { repo, cache }
    }

    pub async fn create(
        &self,
        module: Module,
        command: CreateEntryCommand,
    ) -> Result<ContentEntryRecord, AdminWriteError> {
        ensure_entry_backed(module)?;
        let params = CreateEntryParams {
            module,
            title: normalize_title(&command.title)?,
            body: command.body,
            position: command.position,
            published: command.published,
        };

        let entry = self.repo.create(params).await?;
        info!(entry_id = %entry.id, module = module.as_str(), "Content entry created");
        self.cache.purge_for(module).await;
        Ok(entry)
    }

    pub async fn update(
        &self,
        id: Uuid,
        command: UpdateEntryCommand,
    ) -> Result<ContentEntryRecord, AdminWriteError> {
        let current = self.repo.find_by_id(id).await?.ok_or(RepoError::NotFound)?;

        let params = UpdateEntryParams {
            id,
            title: match command.title {
                Some(title) => normalize_title(&title)?,
                None => current.title,
            },
            body: command.body.unwrap_or(current.body),
            position: command.position.unwrap_or(current.position),
            published: command.published.unwrap_or(current.published),
        };

        let entry = self.repo.update(params).await?;
        info!(entry_id = %entry.id, module = entry.module.as_str(), "Content entry updated");
        self.cache.purge_for(entry.module).await;
        Ok(entry)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AdminWriteError> {
        let entry = self.repo.delete(id).await?;
        info!(entry_id = %entry.id, module = entry.module.as_str(), "Content entry deleted");
        self.cache.purge_for(entry.module).await;
        Ok(())
    }
}
