use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Server-side record of a background-removal run.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct BackgroundRemovalJob {
    pub id: Uuid,
    pub user_id: String,
    pub file_name: String,
    pub status: JobStatus,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateBackgroundRemovalJob {
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateBackgroundRemovalJob {
    pub status: JobStatus,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
}

impl BackgroundRemovalJob {
    pub async fn find_by_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, BackgroundRemovalJob>(
            r#"SELECT id, user_id, file_name, status, result_url, error_message, created_at, updated_at
               FROM background_removal_jobs
               WHERE user_id = $1
               ORDER BY created_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_for_user(
        pool: &SqlitePool,
        id: Uuid,
        user_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, BackgroundRemovalJob>(
            r#"SELECT id, user_id, file_name, status, result_url, error_message, created_at, updated_at
               FROM background_removal_jobs
               WHERE id = $1 AND user_id = $2"#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        user_id: &str,
        data: &CreateBackgroundRemovalJob,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, BackgroundRemovalJob>(
            r#"INSERT INTO background_removal_jobs (id, user_id, file_name)
               VALUES ($1, $2, $3)
               RETURNING id, user_id, file_name, status, result_url, error_message, created_at, updated_at"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&data.file_name)
        .fetch_one(pool)
        .await
    }

    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        user_id: &str,
        data: &UpdateBackgroundRemovalJob,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, BackgroundRemovalJob>(
            r#"UPDATE background_removal_jobs
               SET status = $3,
                   result_url = COALESCE($4, result_url),
                   error_message = $5,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND user_id = $2
               RETURNING id, user_id, file_name, status, result_url, error_message, created_at, updated_at"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(data.status)
        .bind(&data.result_url)
        .bind(&data.error_message)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: &str) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM background_removal_jobs WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}
