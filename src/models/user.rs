//! User model
//!
//! The full user/account model lives outside this service; only the fields
//! needed for filtering, authorization, and the derived direction status are
//! kept here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Email address
    pub email: String,
    /// Display name
    pub name: String,
    /// Role
    pub role: UserRole,
    /// Account status
    pub status: UserStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Administrator - may modify any post and run bulk operations
    Admin,
    /// Doctor/expert - may author posts within their type scope
    Doctor,
}

impl UserRole {
    /// Convert role to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Doctor => "doctor",
        }
    }

    /// Parse role from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "doctor" => Some(UserRole::Doctor),
            _ => None,
        }
    }
}

/// User account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Active account
    Active,
    /// Soft-deleted account; excluded from direction status recomputation
    Deleted,
}

impl UserStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Deleted => "deleted",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(UserStatus::Active),
            "deleted" => Some(UserStatus::Deleted),
            _ => None,
        }
    }
}
