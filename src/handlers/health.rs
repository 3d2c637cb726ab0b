use crate::startup::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{response::IntoResponse, Json};
use serde_json::json;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "resource-hub",
                "version": env!("CARGO_PKG_VERSION"),
                "database": "up"
            })),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "service": "resource-hub",
                "version": env!("CARGO_PKG_VERSION"),
                "database": "down"
            })),
        ),
    }
}
