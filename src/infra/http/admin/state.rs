use std::sync::Arc;

use crate::application::admin::{entries::EntryService, social_links::SocialLinkService};
use crate::cache::SnapshotCache;
use crate::infra::db::PostgresRepositories;

#[derive(Clone)]
pub struct AdminState {
    pub social_links: Arc<SocialLinkService>,
    pub entries: Arc<EntryService>,
    pub cache: Arc<SnapshotCache>,
    pub db: Option<Arc<PostgresRepositories>>,
}
