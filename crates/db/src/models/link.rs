use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A saved link owned by one user.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct Link {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateLink {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateLink {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

impl Link {
    pub async fn find_by_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Link>(
            r#"SELECT id, user_id, title, url, description, created_at, updated_at
               FROM links
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
        sqlx::query_as::<_, Link>(
            r#"SELECT id, user_id, title, url, description, created_at, updated_at
               FROM links
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
        data: &CreateLink,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Link>(
            r#"INSERT INTO links (id, user_id, title, url, description)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, user_id, title, url, description, created_at, updated_at"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&data.title)
        .bind(&data.url)
        .bind(&data.description)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        user_id: &str,
        data: &UpdateLink,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Link>(
            r#"UPDATE links
               SET title = COALESCE($3, title),
                   url = COALESCE($4, url),
                   description = COALESCE($5, description),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND user_id = $2
               RETURNING id, user_id, title, url, description, created_at, updated_at"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&data.title)
        .bind(&data.url)
        .bind(&data.description)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
