//! User repository
//!
//! The user/account model is mostly external to this service; this
//! repository keeps just enough to resolve session tokens to principals and
//! fetch users for authorization checks.

use crate::db::DbPool;
use crate::models::{User, UserRole, UserStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Resolve a session token to its active user; expired sessions and
    /// deleted accounts resolve to `None`
    async fn get_by_session_token(&self, token: &str) -> Result<Option<User>>;
}

const USER_COLUMNS: &str = "u.id, u.email, u.name, u.role, u.status, u.created_at";

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DbPool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for use with dependency injection
    pub fn shared(pool: DbPool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users u WHERE u.id = ?", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get user by ID")?;

        row.map(|row| row_to_user(&row)).transpose()
    }

    async fn get_by_session_token(&self, token: &str) -> Result<Option<User>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM sessions s
            INNER JOIN users u ON u.id = s.user_id
            WHERE s.token = ? AND s.expires_at > ? AND u.status = 'active'
            "#,
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(token)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to resolve session token")?;

        row.map(|row| row_to_user(&row)).transpose()
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid user role: {}", role_str))?;
    let status_str: String = row.get("status");
    let status = UserStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid user status: {}", status_str))?;

    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        role,
        status,
        created_at: row.get("created_at"),
    })
}
