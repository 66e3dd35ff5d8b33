use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, types::Json};
use ts_rs::TS;
use uuid::Uuid;

/// A generated sewing guide for a nylon-fabric project.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct NylonFabricDesign {
    pub id: Uuid,
    pub user_id: String,
    pub project_name: String,
    pub design_text: String,
    /// Image URLs or data URLs for the rendered guide visuals.
    #[ts(type = "Array<string>")]
    pub visuals: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateNylonFabricDesign {
    pub project_name: String,
    pub design_text: String,
    #[serde(default)]
    pub visuals: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateNylonFabricDesign {
    pub project_name: Option<String>,
    pub design_text: Option<String>,
    pub visuals: Option<Vec<String>>,
}

impl NylonFabricDesign {
    pub async fn find_by_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, NylonFabricDesign>(
            r#"SELECT id, user_id, project_name, design_text, visuals, created_at, updated_at
               FROM nylon_fabric_designs
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
        sqlx::query_as::<_, NylonFabricDesign>(
            r#"SELECT id, user_id, project_name, design_text, visuals, created_at, updated_at
               FROM nylon_fabric_designs
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
        data: &CreateNylonFabricDesign,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, NylonFabricDesign>(
            r#"INSERT INTO nylon_fabric_designs (id, user_id, project_name, design_text, visuals)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, user_id, project_name, design_text, visuals, created_at, updated_at"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&data.project_name)
        .bind(&data.design_text)
        .bind(Json(&data.visuals))
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        user_id: &str,
        data: &UpdateNylonFabricDesign,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, NylonFabricDesign>(
            r#"UPDATE nylon_fabric_designs
               SET project_name = COALESCE($3, project_name),
                   design_text = COALESCE($4, design_text),
                   visuals = COALESCE($5, visuals),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND user_id = $2
               RETURNING id, user_id, project_name, design_text, visuals, created_at, updated_at"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&data.project_name)
        .bind(&data.design_text)
        .bind(data.visuals.as_ref().map(Json))
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM nylon_fabric_designs WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
