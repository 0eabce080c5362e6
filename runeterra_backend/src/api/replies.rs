use super::{ApiError, ApiResult, AppState};
use crate::posting::{CreateReplyInput, PostService, ReplyPatch, ReplyView};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ReorderRequest {
    ordered_reply_ids: Vec<String>,
}

fn read_service(state: &AppState) -> PostService {
    PostService::with_avatar_paths(
        state.database.clone(),
        state.locks.clone(),
        &state.config.paths,
    )
}

pub(crate) async fn list_replies(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<Vec<ReplyView>> {
    let service = read_service(&state);
    Ok(Json(service.list_replies(&post_id)?))
}

pub(crate) async fn create_reply(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(payload): Json<CreateReplyInput>,
) -> Result<(StatusCode, Json<ReplyView>), ApiError> {
    let service = PostService::new(state.database.clone(), state.locks.clone());
    let reply = service.create_reply(&post_id, payload)?;
    Ok((StatusCode::CREATED, Json(reply)))
}

/// Drag-reorder for a whole post; all-or-nothing.
pub(crate) async fn reorder_replies(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(payload): Json<ReorderRequest>,
) -> Result<StatusCode, ApiError> {
    let service = PostService::new(state.database.clone(), state.locks.clone());
    service.reorder_replies(&post_id, &payload.ordered_reply_ids)?;
    Ok(StatusCode::OK)
}

pub(crate) async fn update_reply(
    State(state): State<AppState>,
    Path(reply_id): Path<String>,
    Json(payload): Json<ReplyPatch>,
) -> ApiResult<ReplyView> {
    let service = PostService::new(state.database.clone(), state.locks.clone());
    Ok(Json(service.update_reply(&reply_id, payload)?))
}

pub(crate) async fn delete_reply(
    State(state): State<AppState>,
    Path(reply_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let service = PostService::new(state.database.clone(), state.locks.clone());
    service.delete_reply(&reply_id)?;
    Ok(StatusCode::OK)
}
