//! Post type API endpoints
//!
//! - GET /api/v1/post-types - All post types
//! - GET /api/v1/post-types/by-user/{user_id} - Types a user may author

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::models::PostType;

/// Build the post types router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_post_types))
        .route("/by-user/{user_id}", get(list_post_types_by_user))
}

/// GET /api/v1/post-types - All post types
pub async fn list_post_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<PostType>>, ApiError> {
    let types = state
        .post_type_service
        .find_all()
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(types))
}

/// GET /api/v1/post-types/by-user/{user_id} - Types a user may author
pub async fn list_post_types_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<PostType>>, ApiError> {
    let types = state
        .post_type_service
        .find_all_by_user(user_id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(types))
}
