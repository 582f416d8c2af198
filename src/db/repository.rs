//! Namespaced key-value repository over the cache table.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;

/// Durable key-value store scoped to one namespace.
#[derive(Clone)]
pub struct CacheRepository {
    pool: SqlitePool,
    namespace: String,
}

impl CacheRepository {
    pub fn new(pool: SqlitePool, namespace: &str) -> Self {
        Self {
            pool,
            namespace: namespace.to_string(),
        }
    }

    /// Read several keys with a single statement, so the values come from one
    /// consistent state of the table.
    pub async fn get_many(&self, keys: &[&str]) -> Result<HashMap<String, String>, AppError> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; keys.len()].join(", ");
        let sql = format!(
            "SELECT key, value FROM cache_entries WHERE namespace = ? AND key IN ({})",
            placeholders
        );

        let mut query = sqlx::query(&sql).bind(&self.namespace);
        for key in keys {
            query = query.bind(*key);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.get("key"), row.get("value")))
            .collect())
    }

    /// Write all entries in one transaction: readers see either none or all of them.
    pub async fn put_many(&self, entries: &[(String, String)]) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for (key, value) in entries {
            sqlx::query(
                r#"
                INSERT INTO cache_entries (namespace, key, value, updated_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT (namespace, key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&self.namespace)
            .bind(key)
            .bind(value)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Drop every entry in this namespace.
    pub async fn clear(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE namespace = ?")
            .bind(&self.namespace)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
