use super::dto::HealthResponse;
use crate::common::response::ApiSuccess;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tracing::warn;

/// Service health and converter discovery
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "System"
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    // Discovery stats the filesystem and walks PATH.
    let converter = state.converter.clone();
    let located = tokio::task::spawn_blocking(move || converter.locate())
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "converter lookup aborted");
            None
        });

    ApiSuccess(
        HealthResponse {
            status: "healthy".to_string(),
            libreoffice_found: located.is_some(),
            libreoffice_path: located.map(|p| p.to_string_lossy().to_string()),
        },
        StatusCode::OK,
    )
}
