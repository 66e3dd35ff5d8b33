use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::nylon_fabric_design::{
    CreateNylonFabricDesign, NylonFabricDesign, UpdateNylonFabricDesign,
};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, auth::AuthUser, error::ApiError};

pub async fn list_designs(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<Vec<NylonFabricDesign>>>, ApiError> {
    let designs = NylonFabricDesign::find_by_user(&state.db().pool, &user.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(designs)))
}

pub async fn create_design(
    State(state): State<AppState>,
    user: AuthUser,
    axum::Json(payload): axum::Json<CreateNylonFabricDesign>,
) -> Result<ResponseJson<ApiResponse<NylonFabricDesign>>, ApiError> {
    if payload.project_name.trim().is_empty() {
        return Err(ApiError::BadRequest("project_name is required".to_string()));
    }
    let design =
        NylonFabricDesign::create(&state.db().pool, Uuid::new_v4(), &user.user_id, &payload)
            .await?;
    Ok(ResponseJson(ApiResponse::success(design)))
}

pub async fn get_design(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<NylonFabricDesign>>, ApiError> {
    let design = NylonFabricDesign::find_for_user(&state.db().pool, id, &user.user_id)
        .await?
        .ok_or(ApiError::NotFound("Nylon fabric design"))?;
    Ok(ResponseJson(ApiResponse::success(design)))
}

pub async fn update_design(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateNylonFabricDesign>,
) -> Result<ResponseJson<ApiResponse<NylonFabricDesign>>, ApiError> {
    if payload
        .project_name
        .as_deref()
        .is_some_and(|name| name.trim().is_empty())
    {
        return Err(ApiError::BadRequest("project_name must not be empty".to_string()));
    }
    let design = NylonFabricDesign::update(&state.db().pool, id, &user.user_id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Nylon fabric design"))?;
    Ok(ResponseJson(ApiResponse::success(design)))
}

pub async fn delete_design(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if NylonFabricDesign::delete(&state.db().pool, id, &user.user_id).await? == 0 {
        return Err(ApiError::NotFound("Nylon fabric design"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/nylon-fabric-designs",
            get(list_designs).post(create_design),
        )
        .route(
            "/nylon-fabric-designs/{id}",
            get(get_design).put(update_design).delete(delete_design),
        )
}
