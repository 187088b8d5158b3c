//! Common API utilities and shared types
//!
//! This module contains shared utilities used across multiple API
//! endpoints: pagination defaults and the comma-separated id-list parsing
//! used by every set-valued filter parameter.

use serde::Deserialize;

// ============================================================================
// Pagination Defaults
// ============================================================================

/// Default page number (0-indexed)
pub fn default_page() -> u32 {
    0
}

/// Default page size
pub fn default_size() -> u32 {
    10
}

/// Basic pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

// ============================================================================
// Id-list parsing
// ============================================================================

/// Parse a comma-separated id list (`"1,2,3"`), deduplicating and sorting.
///
/// An empty string parses to an empty list; surrounding whitespace around
/// items is tolerated. Non-numeric items are an error.
pub fn parse_id_list(raw: &str) -> Result<Vec<i64>, String> {
    let mut ids = Vec::new();
    for item in raw.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let id = item
            .parse::<i64>()
            .map_err(|_| format!("invalid id '{}' in list", item))?;
        ids.push(id);
    }
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

/// Parse an optional set-valued filter parameter.
///
/// An absent parameter or one with no ids means "no constraint" and parses
/// to `None`.
pub fn parse_id_filter(raw: Option<&str>) -> Result<Option<Vec<i64>>, String> {
    match raw {
        None => Ok(None),
        Some(raw) => {
            let ids = parse_id_list(raw)?;
            if ids.is_empty() {
                Ok(None)
            } else {
                Ok(Some(ids))
            }
        }
    }
}
