//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::cache::Module;
use crate::domain::entities::{ContentEntryRecord, SocialLinkRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateSocialLinkParams {
    pub platform: String,
    pub url: String,
    pub sort_order: i32,
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub struct UpdateSocialLinkParams {
    pub id: Uuid,
    pub platform: String,
    pub url: String,
    pub sort_order: i32,
    pub visible: bool,
}

#[async_trait]
pub trait SocialLinksRepo: Send + Sync {
    /// Visible links in display order.
    async fn list_visible(&self) -> Result<Vec<SocialLinkRecord>, RepoError>;

    async fn list_all(&self) -> Result<Vec<SocialLinkRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SocialLinkRecord>, RepoError>;

    async fn create(&self, params: CreateSocialLinkParams) -> Result<SocialLinkRecord, RepoError>;

    async fn update(&self, params: UpdateSocialLinkParams) -> Result<SocialLinkRecord, RepoError>;

    /// Returns the deleted row; `NotFound` when it did not exist.
    async fn delete(&self, id: Uuid) -> Result<SocialLinkRecord, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateEntryParams {
    pub module: Module,
    pub title: String,
    pub body: Value,
    pub position: i32,
    pub published: bool,
}

#[derive(Debug, Clone)]
pub struct UpdateEntryParams {
    pub id: Uuid,
    pub title: String,
    pub body: Value,
    pub position: i32,
    pub published: bool,
}

#[async_trait]
pub trait EntriesRepo: Send + Sync {
    /// Published entries of `module` ordered by position, then newest first.
    async fn list_published(
        &self,
        module: Module,
        limit: Option<u32>,
    ) -> Result<Vec<ContentEntryRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentEntryRecord>, RepoError>;

    async fn create(&self, params: CreateEntryParams) -> Result<ContentEntryRecord, RepoError>;

    async fn update(&self, params: UpdateEntryParams) -> Result<ContentEntryRecord, RepoError>;

    /// Returns the deleted row; `NotFound` when it did not exist.
    async fn delete(&self, id: Uuid) -> Result<ContentEntryRecord, RepoError>;
}
