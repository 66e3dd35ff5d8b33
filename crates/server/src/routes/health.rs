use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use serde::Serialize;
use utils::response::ApiResponse;

use crate::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub local_stores: bool,
    pub ai: bool,
}

pub async fn health(State(state): State<AppState>) -> ResponseJson<ApiResponse<HealthStatus>> {
    ResponseJson(ApiResponse::success(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        local_stores: state.local_stores_enabled(),
        ai: state.assistant().is_some(),
    }))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/health", get(health))
}
