//! Data models
//!
//! This module contains all data structures used throughout the Medpost
//! service. Models represent:
//! - Database entities (Post, Direction, PostType, Tag, Origin, User)
//! - Pagination parameters and results
//! - Internal data transfer objects

mod direction;
mod origin;
mod post;
mod post_type;
mod tag;
mod user;

pub use direction::Direction;
pub use origin::Origin;
pub use post::{
    CreatePostInput, ListParams, PagedResult, Post, PostStatus, PostSummary, UpdatePostInput,
};
pub use post_type::PostType;
pub use tag::Tag;
pub use user::{User, UserRole, UserStatus};
