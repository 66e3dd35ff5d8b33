use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use services::services::account_items::{AccountItemView, load_account_items};
use utils::response::ApiResponse;

use crate::{AppState, auth::AuthUser, error::ApiError};

/// GET /api/account/items
/// Everything the user has saved across tools, tagged by kind, newest first.
pub async fn list_account_items(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<Vec<AccountItemView>>>, ApiError> {
    let items = load_account_items(&state.db().pool, &user.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(items)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/account/items", get(list_account_items))
}
