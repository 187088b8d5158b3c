//! Direction repository
//!
//! Database operations for directions, including the bulk recomputation of
//! the derived `has_doctors`/`has_posts` flags. Each recomputation is a
//! single UPDATE statement, so it is atomic with respect to concurrent
//! readers and idempotent across runs.

use crate::db::DbPool;
use crate::models::Direction;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

/// Direction repository trait
#[async_trait]
pub trait DirectionRepository: Send + Sync {
    /// List all directions
    async fn list_all(&self) -> Result<Vec<Direction>>;

    /// List directions associated with a user
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Direction>>;

    /// Check if a direction exists
    async fn exists(&self, id: i64) -> Result<bool>;

    /// Recompute `has_doctors` for every direction from active doctors;
    /// returns the number of rows touched
    async fn refresh_has_doctors(&self) -> Result<u64>;

    /// Recompute `has_posts` for every direction from published posts;
    /// returns the number of rows touched
    async fn refresh_has_posts(&self) -> Result<u64>;
}

/// SQLx-based direction repository implementation
pub struct SqlxDirectionRepository {
    pool: DbPool,
}

impl SqlxDirectionRepository {
    /// Create a new SQLx direction repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for use with dependency injection
    pub fn shared(pool: DbPool) -> Arc<dyn DirectionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl DirectionRepository for SqlxDirectionRepository {
    async fn list_all(&self) -> Result<Vec<Direction>> {
        let rows = sqlx::query(
            "SELECT id, name, has_doctors, has_posts FROM directions ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list directions")?;

        Ok(rows.iter().map(row_to_direction).collect())
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Direction>> {
        let rows = sqlx::query(
            r#"
            SELECT d.id, d.name, d.has_doctors, d.has_posts
            FROM directions d
            INNER JOIN user_directions ud ON ud.direction_id = d.id
            WHERE ud.user_id = ?
            ORDER BY d.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list directions by user")?;

        Ok(rows.iter().map(row_to_direction).collect())
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM directions WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check direction existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn refresh_has_doctors(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE directions SET has_doctors = EXISTS (
                SELECT 1 FROM user_directions ud
                INNER JOIN users u ON u.id = ud.user_id
                WHERE ud.direction_id = directions.id
                  AND u.role = 'doctor'
                  AND u.status = 'active'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to refresh direction doctor status")?;

        Ok(result.rows_affected())
    }

    async fn refresh_has_posts(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE directions SET has_posts = EXISTS (
                SELECT 1 FROM post_directions pd
                INNER JOIN posts p ON p.id = pd.post_id
                WHERE pd.direction_id = directions.id
                  AND p.status = 'published'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to refresh direction post status")?;

        Ok(result.rows_affected())
    }
}

fn row_to_direction(row: &sqlx::sqlite::SqliteRow) -> Direction {
    Direction {
        id: row.get("id"),
        name: row.get("name"),
        has_doctors: row.get("has_doctors"),
        has_posts: row.get("has_posts"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DbPool, SqlxDirectionRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxDirectionRepository::new(pool.clone());
        (pool, repo)
    }

    async fn seed_direction(pool: &DbPool, name: &str) -> i64 {
        let result = sqlx::query("INSERT INTO directions (name) VALUES (?)")
            .bind(name)
            .execute(pool)
            .await
            .expect("Failed to seed direction");
        result.last_insert_rowid()
    }

    async fn seed_user(pool: &DbPool, email: &str, role: &str, status: &str) -> i64 {
        let result = sqlx::query("INSERT INTO users (email, name, role, status) VALUES (?, ?, ?, ?)")
            .bind(email)
            .bind("Test User")
            .bind(role)
            .bind(status)
            .execute(pool)
            .await
            .expect("Failed to seed user");
        result.last_insert_rowid()
    }

    async fn link_user(pool: &DbPool, user_id: i64, direction_id: i64) {
        sqlx::query("INSERT INTO user_directions (user_id, direction_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(direction_id)
            .execute(pool)
            .await
            .expect("Failed to link user to direction");
    }

    #[tokio::test]
    async fn test_list_all_sorted_by_name() {
        let (pool, repo) = setup_test_repo().await;
        seed_direction(&pool, "Pediatrics").await;
        seed_direction(&pool, "Cardiology").await;

        let directions = repo.list_all().await.expect("list failed");
        assert_eq!(directions.len(), 2);
        assert_eq!(directions[0].name, "Cardiology");
        assert_eq!(directions[1].name, "Pediatrics");
    }

    #[tokio::test]
    async fn test_list_by_user() {
        let (pool, repo) = setup_test_repo().await;
        let cardiology = seed_direction(&pool, "Cardiology").await;
        seed_direction(&pool, "Pediatrics").await;
        let user = seed_user(&pool, "doc@example.com", "doctor", "active").await;
        link_user(&pool, user, cardiology).await;

        let directions = repo.list_by_user(user).await.expect("list failed");
        assert_eq!(directions.len(), 1);
        assert_eq!(directions[0].id, cardiology);
    }

    #[tokio::test]
    async fn test_exists() {
        let (pool, repo) = setup_test_repo().await;
        let id = seed_direction(&pool, "Cardiology").await;

        assert!(repo.exists(id).await.expect("exists failed"));
        assert!(!repo.exists(id + 1).await.expect("exists failed"));
    }

    #[tokio::test]
    async fn test_refresh_has_doctors() {
        let (pool, repo) = setup_test_repo().await;
        let staffed = seed_direction(&pool, "Cardiology").await;
        let orphaned = seed_direction(&pool, "Pediatrics").await;
        let retired = seed_direction(&pool, "Oncology").await;

        let doctor = seed_user(&pool, "doc@example.com", "doctor", "active").await;
        link_user(&pool, doctor, staffed).await;
        let deleted = seed_user(&pool, "gone@example.com", "doctor", "deleted").await;
        link_user(&pool, deleted, retired).await;

        let touched = repo.refresh_has_doctors().await.expect("refresh failed");
        assert_eq!(touched, 3);

        let directions = repo.list_all().await.expect("list failed");
        let by_id = |id: i64| directions.iter().find(|d| d.id == id).unwrap();
        assert!(by_id(staffed).has_doctors);
        assert!(!by_id(orphaned).has_doctors);
        // Only active doctors count
        assert!(!by_id(retired).has_doctors);
    }

    #[tokio::test]
    async fn test_refresh_has_doctors_is_idempotent() {
        let (pool, repo) = setup_test_repo().await;
        let direction = seed_direction(&pool, "Cardiology").await;
        let doctor = seed_user(&pool, "doc@example.com", "doctor", "active").await;
        link_user(&pool, doctor, direction).await;

        repo.refresh_has_doctors().await.expect("refresh failed");
        repo.refresh_has_doctors().await.expect("refresh failed");

        let directions = repo.list_all().await.expect("list failed");
        assert!(directions[0].has_doctors);
    }

    #[tokio::test]
    async fn test_refresh_has_posts() {
        let (pool, repo) = setup_test_repo().await;
        let with_posts = seed_direction(&pool, "Cardiology").await;
        let drafts_only = seed_direction(&pool, "Pediatrics").await;

        let author = seed_user(&pool, "doc@example.com", "doctor", "active").await;
        let type_id = {
            let result = sqlx::query("INSERT INTO post_types (name) VALUES ('Article')")
                .execute(&pool)
                .await
                .expect("Failed to seed type");
            result.last_insert_rowid()
        };

        for (direction, status) in [(with_posts, "published"), (drafts_only, "draft")] {
            let result = sqlx::query(
                "INSERT INTO posts (title, content, status, author_id, type_id) VALUES (?, ?, ?, ?, ?)",
            )
            .bind("t")
            .bind("c")
            .bind(status)
            .bind(author)
            .bind(type_id)
            .execute(&pool)
            .await
            .expect("Failed to seed post");
            sqlx::query("INSERT INTO post_directions (post_id, direction_id) VALUES (?, ?)")
                .bind(result.last_insert_rowid())
                .bind(direction)
                .execute(&pool)
                .await
                .expect("Failed to link post");
        }

        repo.refresh_has_posts().await.expect("refresh failed");

        let directions = repo.list_all().await.expect("list failed");
        let by_id = |id: i64| directions.iter().find(|d| d.id == id).unwrap();
        assert!(by_id(with_posts).has_posts);
        assert!(!by_id(drafts_only).has_posts);
    }
}
