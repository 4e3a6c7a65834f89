use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{CreateEntryParams, EntriesRepo, RepoError, UpdateEntryParams},
    cache::Module,
    domain::entities::ContentEntryRecord,
};

use super::{PostgresRepositories, map_sqlx_error, util::parse_module};

const ENTRY_COLUMNS: &str =
    "id, module, title, body, position, published, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    module: String,
    title: String,
    body: Value,
    position: i32,
    published: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<EntryRow> for ContentEntryRecord {
    type Error = RepoError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            module: parse_module(&row.module)?,
            title: row.title,
            body: row.body,
            position: row.position,
            published: row.published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl EntriesRepo for PostgresRepositories {
    async fn list_published(
        &self,
        module: Module,
        limit: Option<u32>,
    ) -> Result<Vec<ContentEntryRecord>, RepoError> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM content_entries \
             WHERE module = $1 AND published \
             ORDER BY position ASC, updated_at DESC, id ASC \
             LIMIT $2"
        );
        let rows = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(module.as_str())
            .bind(limit.map(i64::from))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(ContentEntryRecord::try_from).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentEntryRecord>, RepoError> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM content_entries WHERE id = $1");
        let row = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(ContentEntryRecord::try_from).transpose()
    }

    async fn create(&self, params: CreateEntryParams) -> Result<ContentEntryRecord, RepoError> {
        let CreateEntryParams {
            module,
            title,
            body,
            position,
            published,
        } = params;

        let sql = format!(
            "INSERT INTO content_entries \
                 (id, module, title, body, position, published, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
             RETURNING {ENTRY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(module.as_str())
            .bind(title)
            .bind(body)
            .bind(position)
            .bind(published)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.try_into()
    }

    async fn update(&self, params: UpdateEntryParams) -> Result<ContentEntryRecord, RepoError> {
        let UpdateEntryParams {
            id,
            title,
            body,
            position,
            published,
        } = params;

        let sql = format!(
            "UPDATE content_entries \
                SET title = $2, body = $3, position = $4, published = $5, updated_at = $6 \
              WHERE id = $1 \
             RETURNING {ENTRY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(id)
            .bind(title)
            .bind(body)
            .bind(position)
            .bind(published)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.try_into()
    }

    async fn delete(&self, id: Uuid) -> Result<ContentEntryRecord, RepoError> {
        let sql = format!("DELETE FROM content_entries WHERE id = $1 RETURNING {ENTRY_COLUMNS}");
        let row = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.try_into()
    }
}
