//! Axum route handlers for the AI functions.

use axum::{extract::State, Json};

use crate::ai::cover_letter::{generate_cover_letter, CoverLetterRequest, CoverLetterResponse};
use crate::ai::improve::{improve_resume, ImproveResumeRequest, ImproveResumeResponse};
use crate::auth::AuthUser;
use crate::errors::{AppError, AppJson};
use crate::llm_client::LlmClient;
use crate::state::AppState;

fn llm(state: &AppState) -> Result<&LlmClient, AppError> {
    state
        .llm
        .as_ref()
        .ok_or_else(|| AppError::AiUnavailable("OpenAI API key not configured".to_string()))
}

/// POST /api/v1/functions/improve-resume
///
/// Returns improved content, suggestions, an ATS score and added keywords.
/// Saving the improved resume is left to the caller.
pub async fn handle_improve_resume(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(request): AppJson<ImproveResumeRequest>,
) -> Result<Json<ImproveResumeResponse>, AppError> {
    let llm = llm(&state)?;
    tracing::debug!("Improving resume for user {}", user.id);
    Ok(Json(improve_resume(llm, &request).await?))
}

/// POST /api/v1/functions/generate-cover-letter
pub async fn handle_generate_cover_letter(
    State(state): State<AppState>,
    AppJson(request): AppJson<CoverLetterRequest>,
) -> Result<Json<CoverLetterResponse>, AppError> {
    let llm = llm(&state)?;
    Ok(Json(generate_cover_letter(llm, &request).await?))
}
