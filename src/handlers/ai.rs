use crate::dtos::AiGenerateRequest;
use crate::error::AppError;
use crate::services::ai::GeneratedDescription;
use crate::startup::AppState;
use axum::extract::State;
use axum::Json;
use validator::Validate;

/// POST /ai/generate
///
/// Drafts a description and three tags for a prospective resource. The
/// result is returned to the caller and never stored.
pub async fn generate_description(
    State(state): State<AppState>,
    Json(payload): Json<AiGenerateRequest>,
) -> Result<Json<GeneratedDescription>, AppError> {
    let payload = payload.sanitized();
    payload.validate()?;

    let generated = state
        .ai
        .generate(&payload.title, payload.resource_type)
        .await?;

    Ok(Json(generated))
}
