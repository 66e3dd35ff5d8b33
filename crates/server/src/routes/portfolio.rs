//! Public portfolio listing plus authenticated editing and CSV import.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::portfolio_item::{CreatePortfolioItem, PortfolioItem, UpdatePortfolioItem};
use services::services::portfolio_import;
use tracing::info;
use utils::{dates::compare_projects_by_date_desc, response::ApiResponse};

use crate::{AppState, auth::AuthUser, error::ApiError};

/// GET /api/portfolio
/// Every item, newest project date first; undated items last.
pub async fn list_items(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<PortfolioItem>>>, ApiError> {
    let mut items = PortfolioItem::find_all(&state.db().pool).await?;
    items.sort_by(|a, b| compare_projects_by_date_desc(a.date.as_deref(), b.date.as_deref()));
    Ok(ResponseJson(ApiResponse::success(items)))
}

/// GET /api/portfolio/{id}
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<PortfolioItem>>, ApiError> {
    let item = PortfolioItem::find_by_id(&state.db().pool, id)
        .await?
        .ok_or(ApiError::NotFound("Portfolio item"))?;
    Ok(ResponseJson(ApiResponse::success(item)))
}

/// POST /api/portfolio
pub async fn create_item(
    State(state): State<AppState>,
    user: AuthUser,
    axum::Json(payload): axum::Json<CreatePortfolioItem>,
) -> Result<ResponseJson<ApiResponse<PortfolioItem>>, ApiError> {
    if payload.is_placeholder() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }
    let item = PortfolioItem::create(&state.db().pool, &payload).await?;
    info!(item_id = item.id, user_id = %user.user_id, "Created portfolio item");
    Ok(ResponseJson(ApiResponse::success(item)))
}

/// PUT /api/portfolio/{id}
pub async fn update_item(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
    axum::Json(payload): axum::Json<UpdatePortfolioItem>,
) -> Result<ResponseJson<ApiResponse<PortfolioItem>>, ApiError> {
    if payload.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }
    let item = PortfolioItem::update(&state.db().pool, id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Portfolio item"))?;
    Ok(ResponseJson(ApiResponse::success(item)))
}

/// DELETE /api/portfolio/{id}
pub async fn delete_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if PortfolioItem::delete(&state.db().pool, id).await? == 0 {
        return Err(ApiError::NotFound("Portfolio item"));
    }
    info!(item_id = id, user_id = %user.user_id, "Deleted portfolio item");
    Ok(ResponseJson(ApiResponse::success(())))
}

/// POST /api/portfolio/import
/// Body is CSV text with a header row.
pub async fn import_items(
    State(state): State<AppState>,
    user: AuthUser,
    body: String,
) -> Result<ResponseJson<ApiResponse<Vec<PortfolioItem>>>, ApiError> {
    let items = portfolio_import::import_csv(&state.db().pool, &body).await?;
    info!(count = items.len(), user_id = %user.user_id, "Imported portfolio items");
    Ok(ResponseJson(ApiResponse::success(items)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/portfolio", get(list_items).post(create_item))
        .route("/portfolio/import", post(import_items))
        .route(
            "/portfolio/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
}
