//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for a specific aggregate.

pub mod direction;
pub mod origin;
pub mod post;
pub mod post_type;
pub mod tag;
pub mod user;

pub use direction::{DirectionRepository, SqlxDirectionRepository};
pub use origin::{OriginRepository, SqlxOriginRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use post_type::{PostTypeRepository, SqlxPostTypeRepository};
pub use tag::{SqlxTagRepository, TagRepository};
pub use user::{SqlxUserRepository, UserRepository};
