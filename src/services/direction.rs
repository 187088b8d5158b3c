//! Direction service
//!
//! Lookups over directions plus the derived status recomputation:
//! - `has_doctors` is refreshed by a periodic background job
//! - `has_posts` is refreshed synchronously from the post mutation path
//!
//! Both recomputations are idempotent single-statement bulk updates; a
//! failed run is logged and only affects that run.

use crate::db::repositories::DirectionRepository;
use crate::models::Direction;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// Direction service
pub struct DirectionService {
    repo: Arc<dyn DirectionRepository>,
}

impl DirectionService {
    /// Create a new direction service
    pub fn new(repo: Arc<dyn DirectionRepository>) -> Self {
        Self { repo }
    }

    /// Get all directions
    pub async fn find_all(&self) -> Result<Vec<Direction>> {
        self.repo.list_all().await.context("Failed to list directions")
    }

    /// Get all directions associated with a user
    pub async fn find_all_by_user(&self, user_id: i64) -> Result<Vec<Direction>> {
        self.repo
            .list_by_user(user_id)
            .await
            .context("Failed to list directions by user")
    }

    /// Recompute `has_doctors` for every direction
    pub async fn refresh_has_doctors(&self) -> Result<u64> {
        self.repo
            .refresh_has_doctors()
            .await
            .context("Failed to refresh direction doctor status")
    }

    /// Recompute `has_posts` for every direction
    pub async fn refresh_has_posts(&self) -> Result<u64> {
        self.repo
            .refresh_has_posts()
            .await
            .context("Failed to refresh direction post status")
    }
}

/// Spawn the periodic `has_doctors` recomputation job.
///
/// The first tick fires immediately, then every `period`. A failing run is
/// logged and the next tick proceeds normally.
pub fn spawn_status_refresh_job(
    service: Arc<DirectionService>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match service.refresh_has_doctors().await {
                Ok(touched) => {
                    tracing::debug!("direction doctor status refreshed ({} rows)", touched)
                }
                Err(e) => tracing::error!("direction doctor status refresh failed: {:#}", e),
            }
        }
    })
}
