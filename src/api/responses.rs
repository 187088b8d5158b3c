//! Shared API response types
//!
//! This module contains the response shapes used across endpoints:
//! - `PostResponse` / `PostSummaryResponse` transport shapes
//! - `PageResponse` paginated envelope with a `content` sequence
//! - `StatusResponse`, the `{success, message}` envelope used by
//!   bulk/mutation endpoints regardless of outcome (always HTTP 200)

use serde::{Deserialize, Serialize};

use crate::models::{PagedResult, Post, PostSummary};

// ============================================================================
// Post Response Types
// ============================================================================

/// Full post response used in detail and listing endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub preview: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub status: String,
    pub important: bool,
    pub author_id: i64,
    pub type_id: i64,
    pub view_count: i64,
    pub created_at: String,
    pub updated_at: String,
    pub direction_ids: Vec<i64>,
    pub tag_ids: Vec<i64>,
    pub origin_ids: Vec<i64>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            preview: post.preview,
            preview_image_url: post.preview_image_url,
            video_url: post.video_url,
            status: post.status.to_string(),
            important: post.important,
            author_id: post.author_id,
            type_id: post.type_id,
            view_count: post.view_count,
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
            direction_ids: post.direction_ids,
            tag_ids: post.tag_ids,
            origin_ids: post.origin_ids,
        }
    }
}

/// Summarized post response for the cross-type latest feed
#[derive(Debug, Serialize, Deserialize)]
pub struct PostSummaryResponse {
    pub id: i64,
    pub title: String,
    pub preview: String,
    pub type_id: i64,
    pub type_name: String,
    pub created_at: String,
}

impl From<PostSummary> for PostSummaryResponse {
    fn from(summary: PostSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            preview: summary.preview,
            type_id: summary.type_id,
            type_name: summary.type_name,
            created_at: summary.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Pagination envelope
// ============================================================================

/// Paginated response envelope with a `content` sequence
#[derive(Debug, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: i64,
    pub total_pages: u32,
}

impl<T> PageResponse<T> {
    /// Build a page envelope from a service result, converting the items
    pub fn from_paged<S: Into<T>>(paged: PagedResult<S>) -> Self {
        let total_pages = paged.total_pages();
        Self {
            content: paged.items.into_iter().map(Into::into).collect(),
            page: paged.page,
            size: paged.size,
            total_elements: paged.total,
            total_pages,
        }
    }
}

// ============================================================================
// Status envelope
// ============================================================================

/// Uniform `{success, message}` envelope for bulk/mutation endpoints
///
/// These endpoints always answer HTTP 200; business failures surface as
/// `success=false` with the error text.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

impl StatusResponse {
    /// Successful outcome
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Failed outcome; the message carries the error text verbatim
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
