//! Tag repository

use crate::db::DbPool;
use crate::models::Tag;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// List all tags
    async fn list_all(&self) -> Result<Vec<Tag>>;

    /// Check if a tag exists
    async fn exists(&self, id: i64) -> Result<bool>;
}

/// SQLx-based tag repository implementation
pub struct SqlxTagRepository {
    pool: DbPool,
}

impl SqlxTagRepository {
    /// Create a new SQLx tag repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for use with dependency injection
    pub fn shared(pool: DbPool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn list_all(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query("SELECT id, name FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list tags")?;

        Ok(rows
            .iter()
            .map(|row| Tag {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM tags WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check tag existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    #[tokio::test]
    async fn test_list_and_exists() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxTagRepository::new(pool.clone());

        let id = sqlx::query("INSERT INTO tags (name) VALUES ('covid')")
            .execute(&pool)
            .await
            .expect("Failed to seed tag")
            .last_insert_rowid();

        let tags = repo.list_all().await.expect("list failed");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "covid");

        assert!(repo.exists(id).await.expect("exists failed"));
        assert!(!repo.exists(id + 1).await.expect("exists failed"));
    }
}
