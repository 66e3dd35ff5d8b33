//! Server-side records of background-removal runs. The images themselves stay
//! in the caller's local store; these rows only track status.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::background_removal_job::{
    BackgroundRemovalJob, CreateBackgroundRemovalJob, JobStatus, UpdateBackgroundRemovalJob,
};
use tracing::debug;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, auth::AuthUser, error::ApiError};

pub async fn list_jobs(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<Vec<BackgroundRemovalJob>>>, ApiError> {
    let jobs = BackgroundRemovalJob::find_by_user(&state.db().pool, &user.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(jobs)))
}

pub async fn create_job(
    State(state): State<AppState>,
    user: AuthUser,
    axum::Json(payload): axum::Json<CreateBackgroundRemovalJob>,
) -> Result<ResponseJson<ApiResponse<BackgroundRemovalJob>>, ApiError> {
    if payload.file_name.trim().is_empty() {
        return Err(ApiError::BadRequest("file_name is required".to_string()));
    }
    let job =
        BackgroundRemovalJob::create(&state.db().pool, Uuid::new_v4(), &user.user_id, &payload)
            .await?;
    Ok(ResponseJson(ApiResponse::success(job)))
}

pub async fn get_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<BackgroundRemovalJob>>, ApiError> {
    let job = BackgroundRemovalJob::find_for_user(&state.db().pool, id, &user.user_id)
        .await?
        .ok_or(ApiError::NotFound("Background removal job"))?;
    Ok(ResponseJson(ApiResponse::success(job)))
}

/// PATCH /api/background-removal/jobs/{id}
/// A failed status needs an error message; other statuses clear it.
pub async fn update_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    axum::Json(mut payload): axum::Json<UpdateBackgroundRemovalJob>,
) -> Result<ResponseJson<ApiResponse<BackgroundRemovalJob>>, ApiError> {
    match payload.status {
        JobStatus::Failed if payload.error_message.is_none() => {
            return Err(ApiError::BadRequest(
                "error_message is required for a failed job".to_string(),
            ));
        }
        JobStatus::Failed => {}
        _ => payload.error_message = None,
    }

    let job = BackgroundRemovalJob::update_status(&state.db().pool, id, &user.user_id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Background removal job"))?;
    debug!(job_id = %job.id, status = %job.status, "Updated background removal job");
    Ok(ResponseJson(ApiResponse::success(job)))
}

pub async fn delete_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if BackgroundRemovalJob::delete(&state.db().pool, id, &user.user_id).await? == 0 {
        return Err(ApiError::NotFound("Background removal job"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/background-removal/jobs", get(list_jobs).post(create_job))
        .route(
            "/background-removal/jobs/{id}",
            get(get_job).patch(update_job).delete(delete_job),
        )
}
