use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

/// Kind of work a portfolio entry showcases.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "portfolio_item_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PortfolioItemType {
    Video,
    Photo,
    #[default]
    Project,
    Website,
    Art,
    Tool,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct PortfolioItem {
    pub id: i64,
    pub title: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub item_type: PortfolioItemType,
    pub date: Option<String>, // Free-form, ordered with utils::dates
    pub description: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub tags: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq, Default)]
pub struct CreatePortfolioItem {
    pub title: String,
    #[serde(rename = "type", default)]
    pub item_type: PortfolioItemType,
    pub date: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub tags: Option<String>,
}

impl CreatePortfolioItem {
    /// The blank entry that leads every CSV import.
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn is_placeholder(&self) -> bool {
        self.title.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdatePortfolioItem {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<PortfolioItemType>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub tags: Option<String>,
}

const COLUMNS: &str =
    "id, title, type, date, description, url, image_url, tags, created_at, updated_at";

impl PortfolioItem {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PortfolioItem>(&format!(
            "SELECT {COLUMNS} FROM portfolio_items ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PortfolioItem>(&format!(
            "SELECT {COLUMNS} FROM portfolio_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM portfolio_items")
            .fetch_one(pool)
            .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreatePortfolioItem) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, PortfolioItem>(&format!(
            r#"INSERT INTO portfolio_items (title, type, date, description, url, image_url, tags)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING {COLUMNS}"#
        ))
        .bind(&data.title)
        .bind(data.item_type)
        .bind(&data.date)
        .bind(&data.description)
        .bind(&data.url)
        .bind(&data.image_url)
        .bind(&data.tags)
        .fetch_one(pool)
        .await
    }

    /// Inserts every non-placeholder draft in one transaction.
    pub async fn create_many(
        pool: &SqlitePool,
        items: &[CreatePortfolioItem],
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut created = Vec::with_capacity(items.len());
        for data in items.iter().filter(|item| !item.is_placeholder()) {
            let item = sqlx::query_as::<_, PortfolioItem>(&format!(
                r#"INSERT INTO portfolio_items (title, type, date, description, url, image_url, tags)
                   VALUES ($1, $2, $3, $4, $5, $6, $7)
                   RETURNING {COLUMNS}"#
            ))
            .bind(&data.title)
            .bind(data.item_type)
            .bind(&data.date)
            .bind(&data.description)
            .bind(&data.url)
            .bind(&data.image_url)
            .bind(&data.tags)
            .fetch_one(&mut *tx)
            .await?;
            created.push(item);
        }
        tx.commit().await?;
        Ok(created)
    }

    /// Applies the fields present in `data`; absent fields keep their value.
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        data: &UpdatePortfolioItem,
    ) -> Result<Option<Self>, sqlx::Error> {
        let Some(existing) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let title = data.title.clone().unwrap_or(existing.title);
        let item_type = data.item_type.unwrap_or(existing.item_type);
        let date = data.date.clone().or(existing.date);
        let description = data.description.clone().or(existing.description);
        let url = data.url.clone().or(existing.url);
        let image_url = data.image_url.clone().or(existing.image_url);
        let tags = data.tags.clone().or(existing.tags);

        sqlx::query_as::<_, PortfolioItem>(&format!(
            r#"UPDATE portfolio_items
               SET title = $2, type = $3, date = $4, description = $5, url = $6,
                   image_url = $7, tags = $8, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {COLUMNS}"#
        ))
        .bind(id)
        .bind(title)
        .bind(item_type)
        .bind(date)
        .bind(description)
        .bind(url)
        .bind(image_url)
        .bind(tags)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM portfolio_items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    fn draft(title: &str, date: Option<&str>) -> CreatePortfolioItem {
        CreatePortfolioItem {
            title: title.to_string(),
            item_type: PortfolioItemType::Video,
            date: date.map(str::to_string),
            description: Some("desc".to_string()),
            url: Some("https://example.com".to_string()),
            image_url: None,
            tags: Some("film, 16mm".to_string()),
        }
    }

    #[tokio::test]
    async fn create_then_find_returns_same_fields() {
        let db = DBService::new_in_memory().await.unwrap();
        let created = PortfolioItem::create(&db.pool, &draft("Reel", Some("07/2025")))
            .await
            .unwrap();

        let found = PortfolioItem::find_by_id(&db.pool, created.id)
            .await
            .unwrap()
            .expect("item exists");
        assert_eq!(found, created);
        assert_eq!(found.item_type, PortfolioItemType::Video);
        assert_eq!(found.date.as_deref(), Some("07/2025"));
    }

    #[tokio::test]
    async fn create_many_skips_placeholder() {
        let db = DBService::new_in_memory().await.unwrap();
        let items = vec![
            CreatePortfolioItem::placeholder(),
            draft("A", None),
            draft("B", Some("2019")),
        ];
        let created = PortfolioItem::create_many(&db.pool, &items).await.unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(PortfolioItem::count(&db.pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn update_keeps_absent_fields() {
        let db = DBService::new_in_memory().await.unwrap();
        let created = PortfolioItem::create(&db.pool, &draft("Old", Some("2020")))
            .await
            .unwrap();

        let update = UpdatePortfolioItem {
            title: Some("New".to_string()),
            item_type: None,
            date: None,
            description: None,
            url: None,
            image_url: None,
            tags: None,
        };
        let updated = PortfolioItem::update(&db.pool, created.id, &update)
            .await
            .unwrap()
            .expect("item exists");
        assert_eq!(updated.title, "New");
        assert_eq!(updated.date.as_deref(), Some("2020"));
        assert_eq!(updated.item_type, PortfolioItemType::Video);
    }

    #[tokio::test]
    async fn delete_missing_reports_zero_rows() {
        let db = DBService::new_in_memory().await.unwrap();
        assert_eq!(PortfolioItem::delete(&db.pool, 42).await.unwrap(), 0);
    }

    #[test]
    fn item_type_parses_case_insensitively() {
        assert_eq!(
            "Website".parse::<PortfolioItemType>().unwrap(),
            PortfolioItemType::Website
        );
        assert!("sculpture".parse::<PortfolioItemType>().is_err());
    }

    #[test]
    fn serializes_type_field_name() {
        let json = serde_json::to_value(draft("Reel", None)).unwrap();
        assert_eq!(json["type"], "video");
        assert!(json.get("item_type").is_none());
    }
}
