use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::cache::{CacheConfig, Clock, Module, Snapshot, SnapshotStore, StoreError};

use super::PostgresRepositories;

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    module: String,
    payload: Value,
    checksum: String,
    created_at: OffsetDateTime,
    expires_at: OffsetDateTime,
}

impl SnapshotRow {
    fn into_snapshot(self, module: Module) -> Result<Snapshot, StoreError> {
        if self.module != module.as_str() {
            return Err(StoreError::Corrupt {
                module,
                message: format!("row is keyed `{}`", self.module),
            });
        }
        Ok(Snapshot {
            module,
            payload: self.payload,
            checksum: self.checksum,
            created_at: self.created_at,
            expires_at: self.expires_at,
        })
    }
}

/// Snapshot store on the `content_snapshots` table. Every call is a single
/// statement, so each put and invalidate is atomic.
pub struct PostgresSnapshotStore {
    pool: Arc<PgPool>,
    config: Arc<CacheConfig>,
    clock: Arc<dyn Clock>,
}

impl PostgresSnapshotStore {
    pub fn new(
        repos: &PostgresRepositories,
        config: Arc<CacheConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pool: repos.shared_pool(),
            config,
            clock,
        }
    }
}

#[async_trait]
impl SnapshotStore for PostgresSnapshotStore {
    async fn get(&self, module: Module) -> Result<Option<Snapshot>, StoreError> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT module, payload, checksum, created_at, expires_at
            FROM content_snapshots
            WHERE module = $1
            "#,
        )
        .bind(module.as_str())
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(StoreError::unavailable)?;

        row.map(|row| row.into_snapshot(module)).transpose()
    }

    async fn put(
        &self,
        module: Module,
        payload: Value,
        checksum: String,
    ) -> Result<Snapshot, StoreError> {
        let now = self.clock.now();
        let expires_at = now + self.config.ttl(module);

        let row = sqlx::query_as::<_, SnapshotRow>(
            r#"
            INSERT INTO content_snapshots (module, payload, checksum, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (module) DO UPDATE
               SET payload = EXCLUDED.payload,
                   checksum = EXCLUDED.checksum,
                   created_at = EXCLUDED.created_at,
                   expires_at = EXCLUDED.expires_at
            RETURNING module, payload, checksum, created_at, expires_at
            "#,
        )
        .bind(module.as_str())
        .bind(&payload)
        .bind(&checksum)
        .bind(now)
        .bind(expires_at)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(StoreError::unavailable)?;

        row.into_snapshot(module)
    }

    async fn invalidate(&self, module: Module) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE content_snapshots
               SET expires_at = to_timestamp(0)
             WHERE module = $1
            "#,
        )
        .bind(module.as_str())
        .execute(self.pool.as_ref())
        .await
        .map_err(StoreError::unavailable)?;

        Ok(())
    }
}
