use super::{ApiError, ApiResult, AppState};
use crate::posting::{CreatePostInput, PostPatch, PostService, PostView};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct ListPostsParams {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LikeRequest {
    user_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LikeStatusParams {
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LikeResponse {
    liked: bool,
}

fn read_service(state: &AppState) -> PostService {
    PostService::with_avatar_paths(
        state.database.clone(),
        state.locks.clone(),
        &state.config.paths,
    )
}

pub(crate) async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListPostsParams>,
) -> ApiResult<Vec<PostView>> {
    let service = read_service(&state);
    let limit = params.limit.unwrap_or(20).min(200);
    let page = params.page.unwrap_or(1).max(1);
    let offset = (page - 1) * limit;
    let category = params
        .category
        .as_deref()
        .filter(|category| !category.is_empty());
    Ok(Json(service.list_posts(category, limit, offset)?))
}

pub(crate) async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PostView> {
    let service = read_service(&state);
    Ok(Json(service.get_post(&id)?))
}

pub(crate) async fn create_post(
    State(state): State<AppState>,
    Json(payload): Json<CreatePostInput>,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    let service = PostService::new(state.database.clone(), state.locks.clone());
    let post = service.create_post(payload)?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub(crate) async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<PostPatch>,
) -> ApiResult<PostView> {
    let service = PostService::new(state.database.clone(), state.locks.clone());
    Ok(Json(service.update_post(&id, payload)?))
}

pub(crate) async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let service = PostService::new(state.database.clone(), state.locks.clone());
    service.delete_post(&id)?;
    Ok(StatusCode::OK)
}

pub(crate) async fn toggle_like(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<LikeRequest>,
) -> ApiResult<LikeResponse> {
    let service = PostService::new(state.database.clone(), state.locks.clone());
    let liked = service.toggle_like(&id, &payload.user_id)?;
    Ok(Json(LikeResponse { liked }))
}

pub(crate) async fn like_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<LikeStatusParams>,
) -> ApiResult<LikeResponse> {
    let Some(user_id) = params.user_id.filter(|user_id| !user_id.is_empty()) else {
        return Ok(Json(LikeResponse { liked: false }));
    };
    let service = PostService::new(state.database.clone(), state.locks.clone());
    let liked = service.is_liked(&id, &user_id)?;
    Ok(Json(LikeResponse { liked }))
}
