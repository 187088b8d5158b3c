//! Database layer
//!
//! This module provides persistence for the Medpost service:
//! - SQLite connection pool (single-binary deployment)
//! - Embedded code-based migrations
//! - Trait-based repositories, one per aggregate

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, DbPool};
