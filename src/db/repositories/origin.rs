//! Origin repository

use crate::db::DbPool;
use crate::models::Origin;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

/// Origin repository trait
#[async_trait]
pub trait OriginRepository: Send + Sync {
    /// List all origins
    async fn list_all(&self) -> Result<Vec<Origin>>;

    /// Check if an origin exists
    async fn exists(&self, id: i64) -> Result<bool>;
}

/// SQLx-based origin repository implementation
pub struct SqlxOriginRepository {
    pool: DbPool,
}

impl SqlxOriginRepository {
    /// Create a new SQLx origin repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for use with dependency injection
    pub fn shared(pool: DbPool) -> Arc<dyn OriginRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl OriginRepository for SqlxOriginRepository {
    async fn list_all(&self) -> Result<Vec<Origin>> {
        let rows = sqlx::query("SELECT id, name FROM origins ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list origins")?;

        Ok(rows
            .iter()
            .map(|row| Origin {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM origins WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check origin existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }
}
