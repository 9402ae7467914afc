use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgQueryResult;
use sqlx::{Pool, Postgres};

use crate::cache::Cache;
use crate::error::StoreError;

pub const DEFAULT_CACHE_TABLE: &str = "cache_entries";

/// [`Cache`] kept in an unlogged Postgres table.
///
/// `set_if_absent` is a single `INSERT ... ON CONFLICT DO UPDATE ... WHERE expired` statement, so
/// exactly one of several racing callers acquires a given key.
#[derive(Clone, Debug)]
pub struct PgCache {
    pool: Pool<Postgres>,
    set_if_absent: String,
    delete: String,
    purge_expired: String,
}

impl PgCache {
    /// Deletes every expired entry. Returns the number of entries removed.
    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        Ok(sqlx::query(&self.purge_expired)
            .execute(&self.pool)
            .await?
            .rows_affected())
    }
}

#[async_trait]
impl Cache for PgCache {
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let ttl_ms: i64 = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let result: PgQueryResult = sqlx::query(&self.set_if_absent)
            .bind(key)
            .bind(ttl_ms)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let _: PgQueryResult = sqlx::query(&self.delete).bind(key).execute(&self.pool).await?;
        Ok(())
    }
}

/// Struct used to build a brand new [`PgCache`].
pub struct PgCacheBuilder {
    pool: Pool<Postgres>,
    table: String,
    run_migrations: bool,
}

impl PgCacheBuilder {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            pool,
            table: DEFAULT_CACHE_TABLE.to_string(),
            run_migrations: true,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn without_running_migrations(mut self) -> Self {
        self.run_migrations = false;
        self
    }

    /// # Errors
    ///
    /// Will return an `Err` if there's an error creating the cache table.
    pub async fn try_build(self) -> Result<PgCache, sqlx::Error> {
        let table = self.table;

        if self.run_migrations {
            let create_table = format!(
                "
    CREATE UNLOGGED TABLE IF NOT EXISTS {table}
    (
      key TEXT PRIMARY KEY,
      expires_at TIMESTAMPTZ NOT NULL
    )
    "
            );
            let _: PgQueryResult = sqlx::query(&create_table).execute(&self.pool).await?;
        }

        Ok(PgCache {
            pool: self.pool,
            set_if_absent: format!(
                "
    INSERT INTO {table} (key, expires_at)
    VALUES ($1, NOW() + $2 * INTERVAL '1 millisecond')
    ON CONFLICT (key) DO UPDATE SET expires_at = EXCLUDED.expires_at
    WHERE {table}.expires_at <= NOW()
    "
            ),
            delete: format!("DELETE FROM {table} WHERE key = $1"),
            purge_expired: format!("DELETE FROM {table} WHERE expires_at <= NOW()"),
        })
    }
}
