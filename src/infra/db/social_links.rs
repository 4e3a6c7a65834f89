use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{
        CreateSocialLinkParams, RepoError, SocialLinksRepo, UpdateSocialLinkParams,
    },
    domain::entities::SocialLinkRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const SOCIAL_LINK_COLUMNS: &str = "id, platform, url, sort_order, visible, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct SocialLinkRow {
    id: Uuid,
    platform: String,
    url: String,
    sort_order: i32,
    visible: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<SocialLinkRow> for SocialLinkRecord {
    fn from(row: SocialLinkRow) -> Self {
        Self {
            id: row.id,
            platform: row.platform,
            url: row.url,
            sort_order: row.sort_order,
            visible: row.visible,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PostgresRepositories {
    async fn list_social_links(&self, visible_only: bool) -> Result<Vec<SocialLinkRecord>, RepoError> {
        let sql = format!(
            "SELECT {SOCIAL_LINK_COLUMNS} FROM social_links \
             WHERE ($1 = FALSE OR visible) \
             ORDER BY sort_order ASC, platform ASC"
        );
        let rows = sqlx::query_as::<_, SocialLinkRow>(&sql)
            .bind(visible_only)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SocialLinkRecord::from).collect())
    }
}

#[async_trait]
impl SocialLinksRepo for PostgresRepositories {
    async fn list_visible(&self) -> Result<Vec<SocialLinkRecord>, RepoError> {
        self.list_social_links(true).await
    }

    async fn list_all(&self) -> Result<Vec<SocialLinkRecord>, RepoError> {
        self.list_social_links(false).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SocialLinkRecord>, RepoError> {
        let sql = format!("SELECT {SOCIAL_LINK_COLUMNS} FROM social_links WHERE id = $1");
        let row = sqlx::query_as::<_, SocialLinkRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(SocialLinkRecord::from))
    }

    async fn create(&self, params: CreateSocialLinkParams) -> Result<SocialLinkRecord, RepoError> {
        let CreateSocialLinkParams {
            platform,
            url,
            sort_order,
            visible,
        } = params;
        let now = OffsetDateTime::now_utc();

        let sql = format!(
            "INSERT INTO social_links (id, platform, url, sort_order, visible, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6) \
             RETURNING {SOCIAL_LINK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SocialLinkRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(platform)
            .bind(url)
            .bind(sort_order)
            .bind(visible)
            .bind(now)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update(&self, params: UpdateSocialLinkParams) -> Result<SocialLinkRecord, RepoError> {
        let UpdateSocialLinkParams {
            id,
            platform,
            url,
            sort_order,
            visible,
        } = params;

        let sql = format!(
            "UPDATE social_links \
                SET platform = $2, url = $3, sort_order = $4, visible = $5, updated_at = $6 \
              WHERE id = $1 \
             RETURNING {SOCIAL_LINK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SocialLinkRow>(&sql)
            .bind(id)
            .bind(platform)
            .bind(url)
            .bind(sort_order)
            .bind(visible)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> Result<SocialLinkRecord, RepoError> {
        let sql = format!("DELETE FROM social_links WHERE id = $1 RETURNING {SOCIAL_LINK_COLUMNS}");
        let row = sqlx::query_as::<_, SocialLinkRow>(&sql)
            .bind(id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
