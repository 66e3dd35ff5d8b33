use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get},
};
use db::models::color_palette::{ColorPalette, CreateColorPalette};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, auth::AuthUser, error::ApiError};

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

pub async fn list_palettes(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<Vec<ColorPalette>>>, ApiError> {
    let palettes = ColorPalette::find_by_user(&state.db().pool, &user.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(palettes)))
}

pub async fn create_palette(
    State(state): State<AppState>,
    user: AuthUser,
    axum::Json(payload): axum::Json<CreateColorPalette>,
) -> Result<ResponseJson<ApiResponse<ColorPalette>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }
    if payload.colors.is_empty() {
        return Err(ApiError::BadRequest("a palette needs at least one color".to_string()));
    }
    if let Some(bad) = payload.colors.iter().find(|c| !is_hex_color(c)) {
        return Err(ApiError::BadRequest(format!("'{bad}' is not a hex color")));
    }

    let palette =
        ColorPalette::create(&state.db().pool, Uuid::new_v4(), &user.user_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(palette)))
}

pub async fn delete_palette(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if ColorPalette::delete(&state.db().pool, id, &user.user_id).await? == 0 {
        return Err(ApiError::NotFound("Color palette"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/color-palettes", get(list_palettes).post(create_palette))
        .route("/color-palettes/{id}", delete(delete_palette))
}
