//! Post type model
//!
//! A post type classifies content (article, video, ...) and scopes which
//! users may author which types.

use serde::{Deserialize, Serialize};

/// Post type entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostType {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
}
