use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use std::path::Path;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub images_dir: String,
    pub thumbnails_dir: String,
    pub version: String,
}

async fn dir_status(dir: &Path) -> String {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => "ready",
        Ok(_) => "not a directory",
        Err(_) => "missing",
    }
    .to_string()
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and storage status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let images_dir = dir_status(&state.config.images_dir).await;
    let thumbnails_dir = dir_status(&state.config.thumbnails_dir).await;

    let status = if images_dir == "ready" && thumbnails_dir == "ready" {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        images_dir,
        thumbnails_dir,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
