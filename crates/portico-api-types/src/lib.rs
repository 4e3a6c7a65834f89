//! Wire types shared between the Portico server and the website's rendering layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// Envelope returned by every public content endpoint.
///
/// `meta.stale` tells the renderer to show a "showing cached content" notice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentEnvelope {
    pub data: Value,
    pub meta: ContentMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentMeta {
    pub module: String,
    pub stale: bool,
    /// Where the payload came from: `hit`, `rebuilt`, `uncached`, `stale_snapshot`,
    /// `fallback` or `missing`.
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialLinkCreateRequest {
    pub platform: String,
    pub url: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub visible: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialLinkUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SocialLinkResponse {
    pub id: Uuid,
    pub platform: String,
    pub url: String,
    pub sort_order: i32,
    pub visible: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryCreateRequest {
    pub title: String,
    #[serde(default)]
    pub body: Value,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "default_true")]
    pub published: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntryResponse {
    pub id: Uuid,
    pub module: String,
    pub title: String,
    pub body: Value,
    pub position: i32,
    pub published: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Snapshot state of one module as reported by the admin cache endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotStatus {
    pub module: String,
    /// `absent`, `fresh`, `stale` or `rebuilding`.
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub created_at: Option<OffsetDateTime>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub expires_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheStatusResponse {
    pub modules: Vec<SnapshotStatus>,
}

fn default_true() -> bool {
    true
}
