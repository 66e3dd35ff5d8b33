use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::link::{CreateLink, Link, UpdateLink};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, auth::AuthUser, error::ApiError};

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

pub async fn list_links(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<Vec<Link>>>, ApiError> {
    let links = Link::find_by_user(&state.db().pool, &user.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(links)))
}

pub async fn create_link(
    State(state): State<AppState>,
    user: AuthUser,
    axum::Json(payload): axum::Json<CreateLink>,
) -> Result<ResponseJson<ApiResponse<Link>>, ApiError> {
    require("title", &payload.title)?;
    require("url", &payload.url)?;
    let link = Link::create(&state.db().pool, Uuid::new_v4(), &user.user_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(link)))
}

pub async fn update_link(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateLink>,
) -> Result<ResponseJson<ApiResponse<Link>>, ApiError> {
    if let Some(title) = &payload.title {
        require("title", title)?;
    }
    if let Some(url) = &payload.url {
        require("url", url)?;
    }
    let link = Link::update(&state.db().pool, id, &user.user_id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Link"))?;
    Ok(ResponseJson(ApiResponse::success(link)))
}

pub async fn delete_link(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if Link::delete(&state.db().pool, id, &user.user_id).await? == 0 {
        return Err(ApiError::NotFound("Link"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/links", get(list_links).post(create_link))
        .route("/links/{id}", put(update_link).delete(delete_link))
}
