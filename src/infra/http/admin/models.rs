//! Record to wire-type conversions for admin responses.

use portico_api_types::{EntryResponse, SnapshotStatus, SocialLinkResponse};

use crate::cache::ModuleStatus;
use crate::domain::entities::{ContentEntryRecord, SocialLinkRecord};

pub(super) fn social_link_response(link: SocialLinkRecord) -> SocialLinkResponse {
    SocialLinkResponse {
        id: link.id,
        platform: link.platform,
        url: link.url,
        sort_order: link.sort_order,
        visible: link.visible,
        updated_at: link.updated_at,
    }
}

pub(super) fn entry_response(entry: ContentEntryRecord) -> EntryResponse {
    EntryResponse {
        id: entry.id,
        module: entry.module.as_str().to_string(),
        title: entry.title,
        body: entry.body,
        position: entry.position,
        published: entry.published,
        updated_at: entry.updated_at,
    }
}

pub(super) fn snapshot_status(status: ModuleStatus) -> SnapshotStatus {
    SnapshotStatus {
        module: status.module.as_str().to_string(),
        state: status.state.as_str().to_string(),
        checksum: status.checksum,
        created_at: status.created_at,
        expires_at: status.expires_at,
    }
}
