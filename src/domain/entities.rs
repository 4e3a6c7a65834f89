//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::cache::Module;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocialLinkRecord {
    pub id: Uuid,
    pub platform: String,
    pub url: String,
    pub sort_order: i32,
    pub visible: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// One item of an entry-backed module: a tender, a news item, a FAQ answer.
/// `body` is free-form JSON owned by the website's templates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentEntryRecord {
    pub id: Uuid,
    pub module: Module,
    pub title: String,
    pub body: Value,
    pub position: i32,
    pub published: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
