//! Post API endpoints
//!
//! Handles HTTP requests for posts:
//! - GET /api/v1/posts/{id} - Get post by ID (404 when absent)
//! - GET /api/v1/posts/latest - Published posts, newest first
//! - GET /api/v1/posts/important - Featured posts
//! - GET /api/v1/posts/latest-by-direction - Direction feed with type/tag filters
//! - GET /api/v1/posts/latest-by-expert - Expert feed with type/direction filters
//! - GET /api/v1/posts/by-author - Author's posts (404 on empty page)
//! - GET /api/v1/posts/all - Three-way set filter (404 on empty page)
//! - GET /api/v1/posts/latest-all - Summarized cross-type feed
//! - GET /api/v1/posts/view-count - URL-keyed view counter lookup
//! - POST /api/v1/posts/view - URL-keyed view counter increment
//! - POST /api/v1/posts - Create post (auth)
//! - PUT /api/v1/posts - Update post by body id (auth, envelope)
//! - DELETE /api/v1/posts/{id} - Archive post (auth, envelope)
//! - GET /api/v1/posts/set-important, /set-unimportant - Bulk flags (admin, envelope)
//!
//! Envelope endpoints always answer HTTP 200; two listing endpoints map an
//! empty page to 404 for compatibility with the observed contract.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{default_page, default_size, parse_id_filter, parse_id_list, PaginationQuery};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{PageResponse, PostResponse, PostSummaryResponse, StatusResponse};
use crate::models::{CreatePostInput, ListParams, PostStatus, UpdatePostInput};

/// Query parameters for the direction feed
#[derive(Debug, Deserialize)]
pub struct DirectionFeedQuery {
    pub direction: i64,
    /// Comma-separated post type ids
    #[serde(rename = "type")]
    pub type_ids: Option<String>,
    /// Comma-separated tag ids
    #[serde(rename = "tag")]
    pub tag_ids: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

/// Query parameters for the expert feed
#[derive(Debug, Deserialize)]
pub struct ExpertFeedQuery {
    pub expert: i64,
    #[serde(rename = "type")]
    pub type_ids: Option<String>,
    #[serde(rename = "direction")]
    pub direction_ids: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

/// Query parameters for the author listing
#[derive(Debug, Deserialize)]
pub struct AuthorQuery {
    pub author: i64,
    pub directions: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

/// Query parameters for the three-way set filter
#[derive(Debug, Deserialize)]
pub struct SetFilterQuery {
    pub directions: Option<String>,
    pub types: Option<String>,
    pub origins: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

/// Query parameters for bulk importance updates
#[derive(Debug, Deserialize)]
pub struct PostIdSetQuery {
    pub posts: Option<String>,
}

/// Query parameters for view counter endpoints
#[derive(Debug, Deserialize)]
pub struct ViewUrlQuery {
    pub url: String,
}

/// View counter response body
#[derive(Debug, serde::Serialize, Deserialize)]
pub struct ViewCountResponse {
    pub count: i64,
}

/// Request body for creating a post
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub preview: String,
    pub preview_image_url: Option<String>,
    pub video_url: Option<String>,
    pub type_id: i64,
    pub direction_ids: Vec<i64>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    #[serde(default)]
    pub origin_ids: Vec<i64>,
    pub status: Option<String>,
}

/// Request body for updating a post; the target id travels in the body
#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
    pub preview: Option<String>,
    pub preview_image_url: Option<String>,
    pub video_url: Option<String>,
    pub type_id: Option<i64>,
    pub direction_ids: Option<Vec<i64>>,
    pub tag_ids: Option<Vec<i64>>,
    pub origin_ids: Option<Vec<i64>>,
}

/// Build the public posts router (read-only)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/latest", get(latest_posts))
        .route("/important", get(important_posts))
        .route("/latest-by-direction", get(latest_by_direction))
        .route("/latest-by-expert", get(latest_by_expert))
        .route("/by-author", get(posts_by_author))
        .route("/all", get(all_posts))
        .route("/latest-all", get(latest_summaries))
        .route("/view-count", get(post_view_count))
        .route("/view", post(record_post_view))
        .route("/{id}", get(get_post))
}

/// Build the protected posts router (requires authentication)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_post))
        .route("/", put(update_post))
        .route("/{id}", delete(archive_post))
}

/// Build the admin posts router (bulk importance flags)
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/set-important", get(set_posts_important))
        .route("/set-unimportant", get(set_posts_unimportant))
}

/// GET /api/v1/posts/{id} - Get post by ID
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state
        .post_service
        .find_by_id(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("Post with {} not found", id)))?;

    Ok(Json(post.into()))
}

/// GET /api/v1/posts/latest - Published posts, newest first
pub async fn latest_posts(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PageResponse<PostResponse>>, ApiError> {
    let params = ListParams::new(query.page, query.size);
    let page = state
        .post_service
        .find_all_by_status(PostStatus::Published, &params)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(PageResponse::from_paged(page)))
}

/// GET /api/v1/posts/important - Featured posts
pub async fn important_posts(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PageResponse<PostResponse>>, ApiError> {
    let params = ListParams::new(query.page, query.size);
    let page = state
        .post_service
        .find_important(&params)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(PageResponse::from_paged(page)))
}

/// GET /api/v1/posts/latest-by-direction - Direction feed
pub async fn latest_by_direction(
    State(state): State<AppState>,
    Query(query): Query<DirectionFeedQuery>,
) -> Result<Json<PageResponse<PostResponse>>, ApiError> {
    let type_ids = parse_id_filter(query.type_ids.as_deref()).map_err(ApiError::validation_error)?;
    let tag_ids = parse_id_filter(query.tag_ids.as_deref()).map_err(ApiError::validation_error)?;
    let params = ListParams::new(query.page, query.size);

    let page = state
        .post_service
        .find_all_by_direction(
            query.direction,
            type_ids.as_deref(),
            tag_ids.as_deref(),
            PostStatus::Published,
            &params,
        )
        .await
        .map_err(ApiError::from)?;

    Ok(Json(PageResponse::from_paged(page)))
}

/// GET /api/v1/posts/latest-by-expert - Expert feed
pub async fn latest_by_expert(
    State(state): State<AppState>,
    Query(query): Query<ExpertFeedQuery>,
) -> Result<Json<PageResponse<PostResponse>>, ApiError> {
    let type_ids = parse_id_filter(query.type_ids.as_deref()).map_err(ApiError::validation_error)?;
    let direction_ids =
        parse_id_filter(query.direction_ids.as_deref()).map_err(ApiError::validation_error)?;
    let params = ListParams::new(query.page, query.size);

    let page = state
        .post_service
        .find_all_by_expert(
            query.expert,
            type_ids.as_deref(),
            direction_ids.as_deref(),
            &params,
        )
        .await
        .map_err(ApiError::from)?;

    Ok(Json(PageResponse::from_paged(page)))
}

/// GET /api/v1/posts/by-author - Author's posts
///
/// An empty page answers 404, matching the observed contract for this
/// endpoint (most listings answer 200 with empty content).
pub async fn posts_by_author(
    State(state): State<AppState>,
    Query(query): Query<AuthorQuery>,
) -> Result<Json<PageResponse<PostResponse>>, ApiError> {
    let direction_ids =
        parse_id_filter(query.directions.as_deref()).map_err(ApiError::validation_error)?;
    let params = ListParams::new(query.page, query.size);

    let page = state
        .post_service
        .find_by_author_and_directions(&params, query.author, direction_ids.as_deref())
        .await
        .map_err(ApiError::from)?;

    if page.is_empty() {
        return Err(ApiError::not_found(format!(
            "no posts found for author {}",
            query.author
        )));
    }

    Ok(Json(PageResponse::from_paged(page)))
}

/// GET /api/v1/posts/all - Three-way direction/type/origin set filter
///
/// A combination matching zero rows answers 404; the service reports it as
/// a NotFound error rather than an empty page.
pub async fn all_posts(
    State(state): State<AppState>,
    Query(query): Query<SetFilterQuery>,
) -> Result<Json<PageResponse<PostResponse>>, ApiError> {
    let direction_ids =
        parse_id_filter(query.directions.as_deref()).map_err(ApiError::validation_error)?;
    let type_ids = parse_id_filter(query.types.as_deref()).map_err(ApiError::validation_error)?;
    let origin_ids =
        parse_id_filter(query.origins.as_deref()).map_err(ApiError::validation_error)?;
    let params = ListParams::new(query.page, query.size);

    let page = state
        .post_service
        .find_all_by_directions_types_origins(
            direction_ids.as_deref(),
            type_ids.as_deref(),
            origin_ids.as_deref(),
            &params,
        )
        .await
        .map_err(ApiError::from)?;

    Ok(Json(PageResponse::from_paged(page)))
}

/// GET /api/v1/posts/latest-all - Summarized cross-type feed
pub async fn latest_summaries(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PageResponse<PostSummaryResponse>>, ApiError> {
    let params = ListParams::new(query.page, query.size);
    let page = state
        .post_service
        .find_latest_summaries(&params)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(PageResponse::from_paged(page)))
}

/// GET /api/v1/posts/view-count - URL-keyed view counter lookup
pub async fn post_view_count(
    State(state): State<AppState>,
    Query(query): Query<ViewUrlQuery>,
) -> Result<Json<ViewCountResponse>, ApiError> {
    let count = state
        .post_service
        .post_view_count(&query.url)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ViewCountResponse { count }))
}

/// POST /api/v1/posts/view - URL-keyed view counter increment
pub async fn record_post_view(
    State(state): State<AppState>,
    Query(query): Query<ViewUrlQuery>,
) -> Result<StatusCode, ApiError> {
    state
        .post_service
        .record_post_view(&query.url)
        .await
        .map_err(ApiError::from)?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/posts - Create a post attributed to the principal
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let status = body.status.as_deref().and_then(PostStatus::from_str);

    let input = CreatePostInput {
        title: body.title,
        content: body.content,
        preview: body.preview,
        preview_image_url: body.preview_image_url,
        video_url: body.video_url,
        type_id: body.type_id,
        direction_ids: body.direction_ids,
        tag_ids: body.tag_ids,
        origin_ids: body.origin_ids,
        status,
    };

    let created = state
        .post_service
        .save_from_user(input, &user.0)
        .await
        .map_err(ApiError::from)?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// PUT /api/v1/posts - Update the post named by the body id
///
/// Always answers HTTP 200 with the `{success, message}` envelope.
pub async fn update_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpdatePostRequest>,
) -> Json<StatusResponse> {
    let id = body.id;
    let input = UpdatePostInput {
        id,
        title: body.title,
        content: body.content,
        preview: body.preview,
        preview_image_url: body.preview_image_url,
        video_url: body.video_url,
        type_id: body.type_id,
        direction_ids: body.direction_ids,
        tag_ids: body.tag_ids,
        origin_ids: body.origin_ids,
    };

    match state.post_service.update_post(&user.0, input).await {
        Ok(_) => Json(StatusResponse::ok(format!("post {} updated successfully", id))),
        Err(e) => Json(StatusResponse::fail(e.to_string())),
    }
}

/// DELETE /api/v1/posts/{id} - Archive a post
///
/// Always answers HTTP 200 with the `{success, message}` envelope.
pub async fn archive_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Json<StatusResponse> {
    match state.post_service.archive_post(&user.0, id).await {
        Ok(_) => Json(StatusResponse::ok(format!("post {} deleted successfully", id))),
        Err(e) => Json(StatusResponse::fail(e.to_string())),
    }
}

/// GET /api/v1/posts/set-important - Bulk-flag posts as important
pub async fn set_posts_important(
    State(state): State<AppState>,
    Query(query): Query<PostIdSetQuery>,
) -> Json<StatusResponse> {
    bulk_importance(&state, query.posts.as_deref(), true).await
}

/// GET /api/v1/posts/set-unimportant - Bulk-clear the importance flag
pub async fn set_posts_unimportant(
    State(state): State<AppState>,
    Query(query): Query<PostIdSetQuery>,
) -> Json<StatusResponse> {
    bulk_importance(&state, query.posts.as_deref(), false).await
}

async fn bulk_importance(
    state: &AppState,
    raw_ids: Option<&str>,
    important: bool,
) -> Json<StatusResponse> {
    let ids = match raw_ids.map(parse_id_list).transpose() {
        Ok(ids) => ids.unwrap_or_default(),
        Err(msg) => return Json(StatusResponse::fail(msg)),
    };

    let result = if important {
        state.post_service.set_posts_as_important(&ids).await
    } else {
        state.post_service.set_posts_as_unimportant(&ids).await
    };

    match result {
        Ok(_) => Json(StatusResponse::ok(format!(
            "importance updated for {} post(s)",
            ids.len()
        ))),
        Err(e) => Json(StatusResponse::fail(e.to_string())),
    }
}
