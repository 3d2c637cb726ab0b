use crate::dtos::{CreateResourceRequest, ListResourcesParams, UpdateResourceRequest};
use crate::error::AppError;
use crate::models::{ListResourcesFilter, Resource, ResourcePage};
use crate::startup::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

/// POST /resources
pub async fn create_resource(
    State(state): State<AppState>,
    Json(payload): Json<CreateResourceRequest>,
) -> Result<(StatusCode, Json<Resource>), AppError> {
    let payload = payload.sanitized();
    payload.validate()?;

    let resource = state.db.create_resource(&payload.into_input()).await?;

    tracing::info!(resource_id = resource.id, "Resource created");
    Ok((StatusCode::CREATED, Json(resource)))
}

/// GET /resources
pub async fn list_resources(
    State(state): State<AppState>,
    Query(params): Query<ListResourcesParams>,
) -> Result<Json<ResourcePage>, AppError> {
    params.validate()?;

    let filter = ListResourcesFilter {
        page: params.page.unwrap_or(1),
        page_size: params.page_size.unwrap_or(state.config.default_page_size),
        search: params
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        resource_type: params.resource_type,
    };

    let page = state.db.list_resources(&filter).await?;
    Ok(Json(page))
}

/// GET /resources/{id}
pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Resource>, AppError> {
    let resource = state
        .db
        .get_resource(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Resource with id {} not found", id)))?;

    Ok(Json(resource))
}

/// PUT /resources/{id}
pub async fn update_resource(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateResourceRequest>,
) -> Result<Json<Resource>, AppError> {
    let payload = payload.sanitized();
    payload.validate()?;

    let resource = state
        .db
        .update_resource(id, &payload.into_patch())
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Resource with id {} not found", id)))?;

    tracing::info!(resource_id = id, "Resource updated");
    Ok(Json(resource))
}

/// DELETE /resources/{id}
pub async fn delete_resource(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_resource(id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Resource with id {} not found",
            id
        )));
    }

    tracing::info!(resource_id = id, "Resource deleted");
    Ok(StatusCode::NO_CONTENT)
}
