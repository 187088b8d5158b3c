//! Direction model
//!
//! A direction is a medical specialty used to classify posts and experts.
//! The `has_doctors` and `has_posts` flags are derived state, recomputed in
//! bulk from related entity existence; they are never set directly.

use serde::{Deserialize, Serialize};

/// Direction entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Direction {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Whether any active doctor is associated with this direction (derived)
    pub has_doctors: bool,
    /// Whether any published post belongs to this direction (derived)
    pub has_posts: bool,
}
