//! Post type service
//!
//! Read-only lookups: all post types, and the subset a given user may
//! author. No mutation.

use crate::db::repositories::PostTypeRepository;
use crate::models::PostType;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Post type service
pub struct PostTypeService {
    repo: Arc<dyn PostTypeRepository>,
}

impl PostTypeService {
    /// Create a new post type service
    pub fn new(repo: Arc<dyn PostTypeRepository>) -> Self {
        Self { repo }
    }

    /// Get all post types
    pub async fn find_all(&self) -> Result<Vec<PostType>> {
        self.repo.list_all().await.context("Failed to list post types")
    }

    /// Get the post types a user may author
    pub async fn find_all_by_user(&self, user_id: i64) -> Result<Vec<PostType>> {
        self.repo
            .list_by_user(user_id)
            .await
            .context("Failed to list post types by user")
    }
}
