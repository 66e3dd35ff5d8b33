use axum::{Router, extract::State, response::Json as ResponseJson, routing::post};
use services::services::media_insight::{AnalyzeMediaRequest, MediaInsight};
use utils::response::ApiResponse;

use crate::{AppState, auth::AuthUser, error::ApiError};

/// POST /api/media-insights/analyze
/// Served from the caller's analysis cache when the file has not changed
/// since it was last analyzed.
pub async fn analyze(
    State(state): State<AppState>,
    user: AuthUser,
    axum::Json(payload): axum::Json<AnalyzeMediaRequest>,
) -> Result<ResponseJson<ApiResponse<MediaInsight>>, ApiError> {
    let insight = state.media_insight().analyze(&user.user_id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(insight)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/media-insights/analyze", post(analyze))
}
