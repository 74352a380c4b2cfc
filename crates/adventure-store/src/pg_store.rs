//! `PostgreSQL` implementation of the `KeyValueStore` trait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::debug;

use adventure_core::error::DomainError;
use adventure_core::store::{KeyValueStore, VersionedRecord};

use crate::schema::CREATE_STORE_TABLES;

#[allow(clippy::needless_pass_by_value)]
fn infrastructure(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("postgres: {err}"))
}

/// PostgreSQL-backed key-value store.
///
/// Conditional writes are single `INSERT .. ON CONFLICT DO NOTHING` or
/// `UPDATE .. WHERE version = $n` statements, so the database row lock is the
/// only coordination between concurrent writers.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the store tables if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the DDL fails.
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::raw_sql(CREATE_STORE_TABLES)
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(())
    }

    async fn current_version(&self, key: &str) -> Result<i64, DomainError> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM store_records WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(infrastructure)?;
        Ok(version.unwrap_or(0))
    }
}

#[async_trait]
impl KeyValueStore for PgStore {
    async fn get(&self, key: &str) -> Result<Option<VersionedRecord>, DomainError> {
        let row = sqlx::query("SELECT value, version FROM store_records WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(infrastructure)?;

        row.map(|row| {
            Ok(VersionedRecord {
                value: row.try_get("value").map_err(infrastructure)?,
                version: row.try_get("version").map_err(infrastructure)?,
            })
        })
        .transpose()
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected_version: Option<i64>,
        value: serde_json::Value,
    ) -> Result<i64, DomainError> {
        let written: Option<i64> = match expected_version {
            None => sqlx::query_scalar(
                "INSERT INTO store_records (key, value, version) VALUES ($1, $2, 1) \
                 ON CONFLICT (key) DO NOTHING RETURNING version",
            )
            .bind(key)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(infrastructure)?,
            Some(expected) => sqlx::query_scalar(
                "UPDATE store_records SET value = $2, version = version + 1, updated_at = NOW() \
                 WHERE key = $1 AND version = $3 RETURNING version",
            )
            .bind(key)
            .bind(value)
            .bind(expected)
            .fetch_optional(&self.pool)
            .await
            .map_err(infrastructure)?,
        };

        match written {
            Some(version) => Ok(version),
            None => {
                let actual = self.current_version(key).await?;
                debug!(key, ?expected_version, actual, "conditional write rejected");
                Err(DomainError::ConcurrencyConflict {
                    key: key.to_owned(),
                    expected: expected_version.unwrap_or(0),
                    actual,
                })
            }
        }
    }

    async fn increment(&self, key: &str, field: &str, delta: i64) -> Result<i64, DomainError> {
        sqlx::query_scalar(
            "INSERT INTO store_counters (key, field, value) VALUES ($1, $2, $3) \
             ON CONFLICT (key, field) DO UPDATE SET value = store_counters.value + EXCLUDED.value \
             RETURNING value",
        )
        .bind(key)
        .bind(field)
        .bind(delta)
        .fetch_one(&self.pool)
        .await
        .map_err(infrastructure)
    }

    async fn counters(&self, key: &str) -> Result<BTreeMap<String, i64>, DomainError> {
        let rows = sqlx::query("SELECT field, value FROM store_counters WHERE key = $1")
            .bind(key)
            .fetch_all(&self.pool)
            .await
            .map_err(infrastructure)?;

        rows.iter()
            .map(|row| {
                let field: String = row.try_get("field").map_err(infrastructure)?;
                let value: i64 = row.try_get("value").map_err(infrastructure)?;
                Ok((field, value))
            })
            .collect()
    }

    async fn push_capped(
        &self,
        key: &str,
        entry: serde_json::Value,
        cap: usize,
    ) -> Result<(), DomainError> {
        let cap = i64::try_from(cap).unwrap_or(i64::MAX);
        let mut tx = self.pool.begin().await.map_err(infrastructure)?;

        sqlx::query("INSERT INTO store_lists (key, entry) VALUES ($1, $2)")
            .bind(key)
            .bind(entry)
            .execute(&mut *tx)
            .await
            .map_err(infrastructure)?;

        sqlx::query(
            "DELETE FROM store_lists WHERE key = $1 AND id NOT IN \
             (SELECT id FROM store_lists WHERE key = $1 ORDER BY id DESC LIMIT $2)",
        )
        .bind(key)
        .bind(cap)
        .execute(&mut *tx)
        .await
        .map_err(infrastructure)?;

        tx.commit().await.map_err(infrastructure)
    }

    async fn list(&self, key: &str) -> Result<Vec<serde_json::Value>, DomainError> {
        sqlx::query_scalar("SELECT entry FROM store_lists WHERE key = $1 ORDER BY id DESC")
            .bind(key)
            .fetch_all(&self.pool)
            .await
            .map_err(infrastructure)
    }
}
