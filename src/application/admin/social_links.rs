use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::AdminWriteError;
use crate::application::repos::{
    CreateSocialLinkParams, RepoError, SocialLinksRepo, UpdateSocialLinkParams,
};
use crate::cache::{Module, SnapshotCache};
use crate::domain::entities::SocialLinkRecord;
use crate::domain::social_links::{normalize_platform, normalize_url};

#[derive(Debug, Clone)]
pub struct CreateSocialLinkCommand {
    pub platform: String,
    pub url: String,
    pub sort_order: i32,
    pub visible: bool,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateSocialLinkCommand {
    pub platform: Option<String>,
    pub url: Option<String>,
    pub sort_order: Option<i32>,
    pub visible: Option<bool>,
}

#[derive(Clone)]
pub struct SocialLinkService {
    repo: Arc<dyn SocialLinksRepo>,
    cache: Arc<SnapshotCache>,
}

impl SocialLinkService {
    pub fn new(repo: Arc<dyn SocialLinksRepo>, cache: Arc<SnapshotCache>) -> Self {
        Self { repo, cache }
    }

    pub async fn list(&self) -> Result<Vec<SocialLinkRecord>, AdminWriteError> {
        Ok(self.repo.list_all().await?)
    }

    pub async fn create(
        &self,
        command: CreateSocialLinkCommand,
    ) -> Result<SocialLinkRecord, AdminWriteError> {
        let params = CreateSocialLinkParams {
            platform: normalize_platform(&command.platform)?,
            url: normalize_url(&command.url)?,
            sort_order: command.sort_order,
            visible: command.visible,
        };

        let link = self.repo.create(params).await?;
        info!(link_id = %link.id, platform = %link.platform, "Social link created");
        self.cache.purge_for(Module::SocialLinks).await;
        Ok(link)
    }

    pub async fn update(
        &self,
        id: Uuid,
        command: UpdateSocialLinkCommand,
    ) -> Result<SocialLinkRecord, AdminWriteError> {
        let current = self.repo.find_by_id(id).await?.ok_or(RepoError::NotFound)?;

        let params = UpdateSocialLinkParams {
            id,
            platform: match command.platform {
                Some(platform) => normalize_platform(&platform)?,
                None => current.platform,
            },
            url: match command.url {
                Some(url) => normalize_url(&url)?,
                None => current.url,
            },
            sort_order: command.sort_order.unwrap_or(current.sort_order),
            visible: command.visible.unwrap_or(current.visible),
        };

        let link = self.repo.update(params).await?;
        info!(link_id = %link.id, "Social link updated");
        self.cache.purge_for(Module::SocialLinks).await;
        Ok(link)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AdminWriteError> {
        let link = self.repo.delete(id).await?;
        info!(link_id = %link.id, "Social link deleted");
        self.cache.purge_for(Module::SocialLinks).await;
        Ok(())
    }
}
