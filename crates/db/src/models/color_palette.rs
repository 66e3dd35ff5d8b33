use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, types::Json};
use ts_rs::TS;
use uuid::Uuid;

/// A palette extracted from an uploaded image. Colors are hex strings.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct ColorPalette {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    #[ts(type = "Array<string>")]
    pub colors: Json<Vec<String>>,
    pub source_file_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateColorPalette {
    pub name: String,
    pub colors: Vec<String>,
    pub source_file_name: Option<String>,
}

impl ColorPalette {
    pub async fn find_by_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ColorPalette>(
            r#"SELECT id, user_id, name, colors, source_file_name, created_at
               FROM color_palettes
               WHERE user_id = $1
               ORDER BY created_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        user_id: &str,
        data: &CreateColorPalette,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ColorPalette>(
            r#"INSERT INTO color_palettes (id, user_id, name, colors, source_file_name)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, user_id, name, colors, source_file_name, created_at"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&data.name)
        .bind(Json(&data.colors))
        .bind(&data.source_file_name)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM color_palettes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    #[tokio::test]
    async fn colors_round_trip_as_json_array() {
        let db = DBService::new_in_memory().await.unwrap();
        let palette = ColorPalette::create(
            &db.pool,
            Uuid::new_v4(),
            "alice",
            &CreateColorPalette {
                name: "Dusk".to_string(),
                colors: vec!["#1a1a2e".to_string(), "#e94560".to_string()],
                source_file_name: Some("sunset.jpg".to_string()),
            },
        )
        .await
        .unwrap();

        let listed = ColorPalette::find_by_user(&db.pool, "alice").await.unwrap();
        assert_eq!(listed, vec![palette.clone()]);
        assert_eq!(palette.colors.0, vec!["#1a1a2e", "#e94560"]);

        let json = serde_json::to_value(&palette).unwrap();
        assert_eq!(json["colors"][1], "#e94560");
    }
}
