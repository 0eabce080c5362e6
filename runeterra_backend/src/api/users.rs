use super::{ApiError, ApiResult, AppState};
use crate::accounts::{RegisterInput, UpdateUserInput, UserService, UserView};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ResolveUserRequest {
    username: String,
}

pub(crate) async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterInput>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let service = UserService::new(state.database.clone());
    let user = service.register(payload)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub(crate) async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<UserView>> {
    let service = UserService::new(state.database.clone());
    Ok(Json(service.list()?))
}

pub(crate) async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserInput>,
) -> ApiResult<UserView> {
    let service = UserService::new(state.database.clone());
    Ok(Json(service.update_profile(&id, payload)?))
}

/// The get-or-create primitive: editors submit a free-text name and get back
/// the account it resolves to, manufacturing one if needed.
pub(crate) async fn resolve_user(
    State(state): State<AppState>,
    Json(payload): Json<ResolveUserRequest>,
) -> ApiResult<UserView> {
    let service = UserService::new(state.database.clone());
    let record = service.resolve_or_create(&payload.username)?;
    let user = service
        .get(&record.id)?
        .ok_or_else(|| ApiError::NotFound(format!("user {} not found", record.id)))?;
    Ok(Json(user))
}
