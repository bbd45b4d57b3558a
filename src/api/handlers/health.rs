use crate::AppState;
use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub cached_entries: usize,
    pub single_flight: bool,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage_status = match state.storage.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!("Storage health probe failed: {:#}", e);
            "disconnected"
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        storage: storage_status.to_string(),
        cached_entries: state.documents.cached_entries(),
        single_flight: state.documents.is_single_flight(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
