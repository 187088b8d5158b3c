//! Post service
//!
//! The single point of business logic for retrieving, filtering, and
//! mutating posts:
//! - Filtered, paginated listings ordered by `(created_at DESC, id DESC)`
//! - Creation attributed to the authenticated principal, with referenced-id
//!   validation
//! - Update and archive behind the injected access policy
//! - Bulk importance flags
//! - URL-keyed view counters (percent-decoded before lookup)
//!
//! Every mutation that can change which directions hold published posts
//! also triggers the synchronous `has_posts` recomputation.

use crate::db::repositories::{
    DirectionRepository, OriginRepository, PostRepository, PostTypeRepository, TagRepository,
};
use crate::models::{
    CreatePostInput, ListParams, PagedResult, Post, PostStatus, PostSummary, UpdatePostInput, User,
};
use crate::services::access::AccessPolicy;
use anyhow::Context;
use std::sync::Arc;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    /// Entity or filter combination resolved to nothing where something was
    /// expected
    #[error("{0}")]
    NotFound(String),

    /// Malformed input: empty id sets, invalid referenced ids, blank fields.
    /// Persistence-layer message text is carried through verbatim.
    #[error("{0}")]
    BadRequest(String),

    /// The principal may not modify this post
    #[error("{0}")]
    Forbidden(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Post service
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    directions: Arc<dyn DirectionRepository>,
    types: Arc<dyn PostTypeRepository>,
    tags: Arc<dyn TagRepository>,
    origins: Arc<dyn OriginRepository>,
    access: Arc<dyn AccessPolicy>,
}

impl PostService {
    /// Create a new post service
    pub fn new(
        repo: Arc<dyn PostRepository>,
        directions: Arc<dyn DirectionRepository>,
        types: Arc<dyn PostTypeRepository>,
        tags: Arc<dyn TagRepository>,
        origins: Arc<dyn OriginRepository>,
        access: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self {
            repo,
            directions,
            types,
            tags,
            origins,
            access,
        }
    }

    /// Get post by ID, counting the read
    ///
    /// Returns `None` when the post does not exist; the HTTP layer maps
    /// that to 404.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Post>, PostServiceError> {
        let post = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get post by ID")?;

        // Reads count views; a failed bump never fails the read
        if post.is_some() {
            if let Err(e) = self.repo.increment_view_count(id).await {
                tracing::debug!("view count increment failed for post {}: {}", id, e);
            }
        }

        Ok(post)
    }

    /// List posts with the given status
    pub async fn find_all_by_status(
        &self,
        status: PostStatus,
        params: &ListParams,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        let items = self
            .repo
            .list_by_status(status, params.offset(), params.limit())
            .await
            .context("Failed to list posts by status")?;
        let total = self
            .repo
            .count_by_status(status)
            .await
            .context("Failed to count posts by status")?;

        Ok(PagedResult::new(items, total, params))
    }

    /// List published posts flagged as important
    pub async fn find_important(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        let items = self
            .repo
            .list_important(params.offset(), params.limit())
            .await
            .context("Failed to list important posts")?;
        let total = self
            .repo
            .count_important()
            .await
            .context("Failed to count important posts")?;

        Ok(PagedResult::new(items, total, params))
    }

    /// List posts in one direction, optionally narrowed by type and tag sets
    ///
    /// An absent or empty set is no constraint for that dimension.
    pub async fn find_all_by_direction(
        &self,
        direction_id: i64,
        type_ids: Option<&[i64]>,
        tag_ids: Option<&[i64]>,
        status: PostStatus,
        params: &ListParams,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        let items = self
            .repo
            .list_by_direction(
                direction_id,
                type_ids,
                tag_ids,
                status,
                params.offset(),
                params.limit(),
            )
            .await
            .context("Failed to list posts by direction")?;
        let total = self
            .repo
            .count_by_direction(direction_id, type_ids, tag_ids, status)
            .await
            .context("Failed to count posts by direction")?;

        Ok(PagedResult::new(items, total, params))
    }

    /// List an expert's published posts, optionally narrowed by type and
    /// direction sets
    pub async fn find_all_by_expert(
        &self,
        author_id: i64,
        type_ids: Option<&[i64]>,
        direction_ids: Option<&[i64]>,
        params: &ListParams,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        let items = self
            .repo
            .list_by_author(
                author_id,
                type_ids,
                direction_ids,
                Some(PostStatus::Published),
                params.offset(),
                params.limit(),
            )
            .await
            .context("Failed to list posts by expert")?;
        let total = self
            .repo
            .count_by_author(
                author_id,
                type_ids,
                direction_ids,
                Some(PostStatus::Published),
            )
            .await
            .context("Failed to count posts by expert")?;

        Ok(PagedResult::new(items, total, params))
    }

    /// List an author's posts of any status, optionally narrowed by
    /// directions
    pub async fn find_by_author_and_directions(
        &self,
        params: &ListParams,
        author_id: i64,
        direction_ids: Option<&[i64]>,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        let items = self
            .repo
            .list_by_author(
                author_id,
                None,
                direction_ids,
                None,
                params.offset(),
                params.limit(),
            )
            .await
            .context("Failed to list posts by author")?;
        let total = self
            .repo
            .count_by_author(author_id, None, direction_ids, None)
            .await
            .context("Failed to count posts by author")?;

        Ok(PagedResult::new(items, total, params))
    }

    /// Three-way optional-set intersection filter over directions, types,
    /// and origins
    ///
    /// Unlike the other listings, a combination that matches nothing is a
    /// `NotFound` error rather than an empty page; callers translate it to
    /// 404. See DESIGN.md for why this asymmetry is kept.
    pub async fn find_all_by_directions_types_origins(
        &self,
        direction_ids: Option<&[i64]>,
        type_ids: Option<&[i64]>,
        origin_ids: Option<&[i64]>,
        params: &ListParams,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        let items = self
            .repo
            .list_by_sets(
                direction_ids,
                type_ids,
                origin_ids,
                params.offset(),
                params.limit(),
            )
            .await
            .context("Failed to filter posts")?;
        let total = self
            .repo
            .count_by_sets(direction_ids, type_ids, origin_ids)
            .await
            .context("Failed to count filtered posts")?;

        if total == 0 {
            return Err(PostServiceError::NotFound(format!(
                "Fail to filter posts with params direction_ids={:?}, type_ids={:?}, origin_ids={:?}",
                direction_ids, type_ids, origin_ids
            )));
        }

        Ok(PagedResult::new(items, total, params))
    }

    /// Cross-type latest-published feed as summarized projections
    pub async fn find_latest_summaries(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<PostSummary>, PostServiceError> {
        let items = self
            .repo
            .list_latest_summaries(params.offset(), params.limit())
            .await
            .context("Failed to list post summaries")?;
        let total = self
            .repo
            .count_by_status(PostStatus::Published)
            .await
            .context("Failed to count published posts")?;

        Ok(PagedResult::new(items, total, params))
    }

    /// Create a post attributed to the authenticated principal
    ///
    /// # Errors
    /// - `BadRequest` when title/content/preview is blank or a referenced
    ///   direction/type/tag/origin id does not exist
    pub async fn save_from_user(
        &self,
        input: CreatePostInput,
        principal: &User,
    ) -> Result<Post, PostServiceError> {
        validate_text_fields(&input.title, &input.content, &input.preview)?;
        self.ensure_refs_exist(
            Some(input.type_id),
            Some(&input.direction_ids),
            Some(&input.tag_ids),
            Some(&input.origin_ids),
        )
        .await?;

        let post = self
            .repo
            .create(principal.id, &input)
            .await
            .context("Failed to create post")?;

        self.refresh_direction_posts().await;

        Ok(post)
    }

    /// Update an existing post on behalf of the principal
    ///
    /// # Errors
    /// - `NotFound` when the id does not exist
    /// - `Forbidden` when the access policy rejects the principal
    /// - `BadRequest` when a replacement referenced id does not exist
    pub async fn update_post(
        &self,
        principal: &User,
        input: UpdatePostInput,
    ) -> Result<bool, PostServiceError> {
        let existing = self
            .repo
            .get_by_id(input.id)
            .await
            .context("Failed to get post by ID")?
            .ok_or_else(|| {
                PostServiceError::NotFound(format!("Post with {} not found", input.id))
            })?;

        if !self.access.can_modify(principal, &existing) {
            return Err(PostServiceError::Forbidden(format!(
                "user {} may not modify post {}",
                principal.id, existing.id
            )));
        }

        self.ensure_refs_exist(
            input.type_id,
            input.direction_ids.as_deref(),
            input.tag_ids.as_deref(),
            input.origin_ids.as_deref(),
        )
        .await?;

        self.repo
            .update(&input)
            .await
            .context("Failed to update post")?;

        self.refresh_direction_posts().await;

        Ok(true)
    }

    /// Archive a post (soft delete) on behalf of the principal
    ///
    /// # Errors
    /// - `NotFound` when the id does not exist
    /// - `Forbidden` when the access policy rejects the principal
    pub async fn archive_post(
        &self,
        principal: &User,
        id: i64,
    ) -> Result<bool, PostServiceError> {
        let existing = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get post by ID")?
            .ok_or_else(|| PostServiceError::NotFound(format!("Post with {} not found", id)))?;

        if !self.access.can_modify(principal, &existing) {
            return Err(PostServiceError::Forbidden(format!(
                "user {} may not modify post {}",
                principal.id, existing.id
            )));
        }

        let archived = self
            .repo
            .archive(id)
            .await
            .context("Failed to archive post")?;
        if !archived {
            return Err(PostServiceError::NotFound(format!(
                "Post with {} not found",
                id
            )));
        }

        self.refresh_direction_posts().await;

        Ok(true)
    }

    /// Bulk-set the importance flag on a set of posts
    ///
    /// The persistence-layer error text for empty sets or missing rows is
    /// surfaced verbatim as `BadRequest`.
    pub async fn set_posts_as_important(&self, ids: &[i64]) -> Result<bool, PostServiceError> {
        self.repo
            .set_important(ids, true)
            .await
            .map_err(|e| PostServiceError::BadRequest(e.to_string()))?;
        Ok(true)
    }

    /// Bulk-clear the importance flag on a set of posts
    pub async fn set_posts_as_unimportant(&self, ids: &[i64]) -> Result<bool, PostServiceError> {
        self.repo
            .set_important(ids, false)
            .await
            .map_err(|e| PostServiceError::BadRequest(e.to_string()))?;
        Ok(true)
    }

    /// Get the view counter for a URL path
    ///
    /// The raw parameter is percent-decoded and normalized before lookup;
    /// unknown URLs count 0.
    pub async fn post_view_count(&self, raw_url: &str) -> Result<i64, PostServiceError> {
        let url = normalize_view_url(raw_url)?;
        let count = self
            .repo
            .view_count_by_url(&url)
            .await
            .context("Failed to get view count")?;
        Ok(count)
    }

    /// Increment the view counter for a URL path
    pub async fn record_post_view(&self, raw_url: &str) -> Result<(), PostServiceError> {
        let url = normalize_view_url(raw_url)?;
        self.repo
            .record_view(&url)
            .await
            .context("Failed to record view")?;
        Ok(())
    }

    async fn ensure_refs_exist(
        &self,
        type_id: Option<i64>,
        direction_ids: Option<&[i64]>,
        tag_ids: Option<&[i64]>,
        origin_ids: Option<&[i64]>,
    ) -> Result<(), PostServiceError> {
        if let Some(type_id) = type_id {
            if !self
                .types
                .exists(type_id)
                .await
                .context("Failed to check post type")?
            {
                return Err(PostServiceError::BadRequest(format!(
                    "post type {} does not exist",
                    type_id
                )));
            }
        }
        if let Some(ids) = direction_ids {
            for id in ids {
                if !self
                    .directions
                    .exists(*id)
                    .await
                    .context("Failed to check direction")?
                {
                    return Err(PostServiceError::BadRequest(format!(
                        "direction {} does not exist",
                        id
                    )));
                }
            }
        }
        if let Some(ids) = tag_ids {
            for id in ids {
                if !self.tags.exists(*id).await.context("Failed to check tag")? {
                    return Err(PostServiceError::BadRequest(format!(
                        "tag {} does not exist",
                        id
                    )));
                }
            }
        }
        if let Some(ids) = origin_ids {
            for id in ids {
                if !self
                    .origins
                    .exists(*id)
                    .await
                    .context("Failed to check origin")?
                {
                    return Err(PostServiceError::BadRequest(format!(
                        "origin {} does not exist",
                        id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Post mutations change which directions hold published posts; the
    /// derived flag is recomputed in the same request. A failed refresh is
    /// logged, never surfaced to the caller.
    async fn refresh_direction_posts(&self) {
        if let Err(e) = self.directions.refresh_has_posts().await {
            tracing::error!("direction post status refresh failed: {:#}", e);
        }
    }
}

fn validate_text_fields(title: &str, content: &str, preview: &str) -> Result<(), PostServiceError> {
    if title.trim().is_empty() {
        return Err(PostServiceError::BadRequest(
            "post title must not be empty".to_string(),
        ));
    }
    if content.trim().is_empty() {
        return Err(PostServiceError::BadRequest(
            "post content must not be empty".to_string(),
        ));
    }
    if preview.trim().is_empty() {
        return Err(PostServiceError::BadRequest(
            "post preview must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Percent-decode and normalize a view-counter URL path
///
/// `%2Fexperts` becomes `/experts`; a missing leading slash is added and a
/// trailing slash (except on the root) is dropped, so equivalent spellings
/// share one counter.
fn normalize_view_url(raw: &str) -> Result<String, PostServiceError> {
    let decoded = urlencoding::decode(raw)
        .map_err(|e| PostServiceError::BadRequest(format!("invalid url encoding: {}", e)))?;

    let mut url = decoded.trim().to_string();
    if url.is_empty() {
        return Err(PostServiceError::BadRequest(
            "url must not be empty".to_string(),
        ));
    }
    if !url.starts_with('/') {
        url.insert(0, '/');
    }
    while url.len() > 1 && url.ends_with('/') {
        url.pop();
    }

    Ok(url)
}
