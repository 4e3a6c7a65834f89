//! Admin write services.
//!
//! Each write goes to the repository first and then purges every snapshot that
//! embeds the written module. The purge is awaited but cannot fail the write.

pub mod entries;
pub mod social_links;

use thiserror::Error;

use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum AdminWriteError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}
