//! Post model
//!
//! This module provides:
//! - `Post` entity representing an expert's publication
//! - `PostStatus` enum for publication states
//! - Input types for creating and updating posts
//! - `PostSummary` projection for the cross-type latest feed
//! - Pagination types for list queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: i64,
    /// Post title
    pub title: String,
    /// Full body content
    pub content: String,
    /// Short preview text shown in listings
    pub preview: String,
    /// Preview image reference
    pub preview_image_url: Option<String>,
    /// Video reference
    pub video_url: Option<String>,
    /// Publication status
    pub status: PostStatus,
    /// Manually set flag featuring the post prominently
    pub important: bool,
    /// Author user ID
    pub author_id: i64,
    /// Post type ID
    pub type_id: i64,
    /// Number of times the post detail has been read
    #[serde(default)]
    pub view_count: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Directions (specialties) the post belongs to
    #[serde(default)]
    pub direction_ids: Vec<i64>,
    /// Tags attached to the post
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    /// Origins (provenance) attached to the post
    #[serde(default)]
    pub origin_ids: Vec<i64>,
}

/// Post publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Draft - not visible to public
    #[default]
    Draft,
    /// Published - visible to public
    Published,
    /// Archived - hidden but never hard-deleted
    Archived,
}

impl PostStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            "archived" => Some(PostStatus::Archived),
            _ => None,
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new post
///
/// The author is not part of the input; it is taken from the authenticated
/// principal by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostInput {
    /// Post title
    pub title: String,
    /// Full body content
    pub content: String,
    /// Short preview text
    pub preview: String,
    /// Preview image reference (optional)
    pub preview_image_url: Option<String>,
    /// Video reference (optional)
    pub video_url: Option<String>,
    /// Post type ID
    pub type_id: i64,
    /// Directions the post belongs to
    pub direction_ids: Vec<i64>,
    /// Tags attached to the post
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    /// Origins attached to the post
    #[serde(default)]
    pub origin_ids: Vec<i64>,
    /// Publication status (defaults to Draft)
    pub status: Option<PostStatus>,
}

/// Input for updating an existing post
///
/// The post to update is identified by `id`; `None` fields keep their
/// current value. Status changes happen only through the archive operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostInput {
    /// ID of the post to update
    pub id: i64,
    /// New title (optional)
    pub title: Option<String>,
    /// New content (optional)
    pub content: Option<String>,
    /// New preview text (optional)
    pub preview: Option<String>,
    /// New preview image reference (optional)
    pub preview_image_url: Option<String>,
    /// New video reference (optional)
    pub video_url: Option<String>,
    /// New post type (optional)
    pub type_id: Option<i64>,
    /// Replacement direction set (optional)
    pub direction_ids: Option<Vec<i64>>,
    /// Replacement tag set (optional)
    pub tag_ids: Option<Vec<i64>>,
    /// Replacement origin set (optional)
    pub origin_ids: Option<Vec<i64>>,
}

/// Summarized post projection for the cross-type latest feed
///
/// Carries the post type name so the main page can render section headers
/// without loading full posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    /// Post ID
    pub id: i64,
    /// Post title
    pub title: String,
    /// Short preview text
    pub preview: String,
    /// Post type ID
    pub type_id: i64,
    /// Post type display name
    pub type_name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Pagination parameters for list queries
///
/// Pages are 0-indexed, matching the observed HTTP contract.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (0-indexed)
    pub page: u32,
    /// Number of items per page
    pub size: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self { page: 0, size: 10 }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        (self.page as i64) * (self.size as i64)
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.size as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (0-indexed)
    pub page: u32,
    /// Number of items per page
    pub size: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            size: params.size,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.size == 0 {
            return 0;
        }
        ((self.total as u32) + self.size - 1) / self.size
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of items in the current page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Convert the items while keeping the pagination metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 0,
            size: 10,
        }
    }
}
