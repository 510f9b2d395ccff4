//! Axum route handlers for the Applications API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::{AppError, AppJson};
use crate::models::application::{Application, ApplicationPatch, ApplicationStatus, NewApplication};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub status: ApplicationStatus,
}

/// GET /api/v1/applications
pub async fn handle_list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Application>>, AppError> {
    let apps = state.applications.for_user(user.id).list().await?;
    Ok(Json(apps))
}

/// GET /api/v1/applications/:id
pub async fn handle_get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, AppError> {
    state
        .applications
        .for_user(user.id)
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
}

/// POST /api/v1/applications
pub async fn handle_create(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(fields): AppJson<NewApplication>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    let app = state.applications.for_user(user.id).create(fields).await?;
    Ok((StatusCode::CREATED, Json(app)))
}

/// PATCH /api/v1/applications/:id
pub async fn handle_update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(fields): AppJson<ApplicationPatch>,
) -> Result<Json<Application>, AppError> {
    let app = state.applications.for_user(user.id).update(id, fields).await?;
    Ok(Json(app))
}

/// DELETE /api/v1/applications/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.applications.for_user(user.id).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/applications/:id/move
///
/// Status-only change; stamps `applied_at` the first time the application reaches `applied`.
pub async fn handle_move(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(request): AppJson<MoveRequest>,
) -> Result<Json<Application>, AppError> {
    let app = state
        .applications
        .for_user(user.id)
        .move_application(id, request.status)
        .await?;
    Ok(Json(app))
}
