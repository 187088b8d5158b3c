//! Origin model
//!
//! An origin is a provenance tag used as an additional filter dimension on
//! posts.

use serde::{Deserialize, Serialize};

/// Origin entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Origin {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
}
