//! Post type repository
//!
//! Read-only lookups over post types, including the per-user authorable
//! subset.

use crate::db::DbPool;
use crate::models::PostType;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

/// Post type repository trait
#[async_trait]
pub trait PostTypeRepository: Send + Sync {
    /// List all post types
    async fn list_all(&self) -> Result<Vec<PostType>>;

    /// List the post types a user may author
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<PostType>>;

    /// Check if a post type exists
    async fn exists(&self, id: i64) -> Result<bool>;
}

/// SQLx-based post type repository implementation
pub struct SqlxPostTypeRepository {
    pool: DbPool,
}

impl SqlxPostTypeRepository {
    /// Create a new SQLx post type repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for use with dependency injection
    pub fn shared(pool: DbPool) -> Arc<dyn PostTypeRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostTypeRepository for SqlxPostTypeRepository {
    async fn list_all(&self) -> Result<Vec<PostType>> {
        let rows = sqlx::query("SELECT id, name FROM post_types ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list post types")?;

        Ok(rows.iter().map(row_to_post_type).collect())
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<PostType>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name
            FROM post_types t
            INNER JOIN user_post_types ut ON ut.type_id = t.id
            WHERE ut.user_id = ?
            ORDER BY t.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list post types by user")?;

        Ok(rows.iter().map(row_to_post_type).collect())
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM post_types WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check post type existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }
}

fn row_to_post_type(row: &sqlx::sqlite::SqliteRow) -> PostType {
    PostType {
        id: row.get("id"),
        name: row.get("name"),
    }
}
