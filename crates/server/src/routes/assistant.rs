use axum::{Router, extract::State, response::Json as ResponseJson, routing::post};
use serde::Deserialize;
use services::services::{
    ai_client::{AiClientError, Message},
    chat_assistant::AssistantReply,
};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, auth::AuthUser, error::ApiError};

#[derive(Debug, Clone, Deserialize, TS)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
}

/// POST /api/assistant/chat
pub async fn chat(
    State(state): State<AppState>,
    user: AuthUser,
    axum::Json(payload): axum::Json<ChatRequest>,
) -> Result<ResponseJson<ApiResponse<AssistantReply>>, ApiError> {
    let assistant = state.assistant().ok_or(AiClientError::NotConfigured)?;
    if !payload.messages.iter().any(|m| m.role == "user") {
        return Err(ApiError::BadRequest(
            "conversation needs at least one user message".to_string(),
        ));
    }

    let reply = assistant.reply(payload.messages).await?;
    tracing::debug!(
        user_id = %user.user_id,
        has_payload = reply.payload.is_some(),
        "Assistant turn"
    );
    Ok(ResponseJson(ApiResponse::success(reply)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/assistant/chat", post(chat))
}
