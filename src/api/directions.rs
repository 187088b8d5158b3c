//! Direction API endpoints
//!
//! - GET /api/v1/directions - All directions
//! - GET /api/v1/directions/by-user/{user_id} - Directions of one user

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::models::Direction;

/// Build the directions router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_directions))
        .route("/by-user/{user_id}", get(list_directions_by_user))
}

/// GET /api/v1/directions - All directions
pub async fn list_directions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Direction>>, ApiError> {
    let directions = state
        .direction_service
        .find_all()
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(directions))
}

/// GET /api/v1/directions/by-user/{user_id} - Directions of one user
pub async fn list_directions_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Direction>>, ApiError> {
    let directions = state
        .direction_service
        .find_all_by_user(user_id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(directions))
}
