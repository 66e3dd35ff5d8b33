//! CSV import for portfolio items.

use std::{collections::HashMap, path::Path, str::FromStr};

use db::models::portfolio_item::{CreatePortfolioItem, PortfolioItem, PortfolioItemType};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

pub const REQUIRED_HEADERS: [&str; 5] = ["title", "type", "date", "description", "url"];

#[derive(Debug, Error)]
pub enum PortfolioImportError {
    #[error("CSV is missing required headers: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),
    #[error("row {row}: unknown portfolio type '{value}'")]
    InvalidType { row: usize, value: String },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// `Image URL`, `image_url` and `imageUrl` all name the same column.
fn normalize_header(header: &str) -> String {
    header
        .trim()
        .chars()
        .filter(|c| *c != '_' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parses portfolio CSV text into drafts ready for insertion.
///
/// The first draft is always [`CreatePortfolioItem::placeholder`], followed
/// by one draft per data row, so `N` rows yield `N + 1` drafts. Insertion
/// skips the placeholder. Empty cells become `None`; `tags` cells are
/// semicolon separated and re-joined with `;` after trimming.
pub fn parse_csv_to_portfolio_items(
    text: &str,
) -> Result<Vec<CreatePortfolioItem>, PortfolioImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let columns: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (normalize_header(h), i))
        .collect();

    let missing: Vec<String> = REQUIRED_HEADERS
        .iter()
        .filter(|h| !columns.contains_key(**h))
        .map(|h| h.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PortfolioImportError::MissingHeaders(missing));
    }

    let mut items = vec![CreatePortfolioItem::placeholder()];
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        // Row 1 is the header line.
        let row = index + 2;
        let cell = |name: &str| {
            columns
                .get(name)
                .and_then(|i| record.get(*i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let item_type = match cell("type") {
            Some(value) => PortfolioItemType::from_str(&value)
                .map_err(|_| PortfolioImportError::InvalidType { row, value })?,
            None => PortfolioItemType::default(),
        };

        let tags = cell("tags").map(|raw| {
            raw.split(';')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(";")
        });

        items.push(CreatePortfolioItem {
            title: cell("title").unwrap_or_default(),
            item_type,
            date: cell("date"),
            description: cell("description"),
            url: cell("url"),
            image_url: cell("imageurl"),
            tags: tags.filter(|t| !t.is_empty()),
        });
    }

    Ok(items)
}

/// Parses `text` and inserts every row in one transaction.
pub async fn import_csv(
    pool: &SqlitePool,
    text: &str,
) -> Result<Vec<PortfolioItem>, PortfolioImportError> {
    let drafts = parse_csv_to_portfolio_items(text)?;
    let created = PortfolioItem::create_many(pool, &drafts).await?;
    info!(
        rows = drafts.len() - 1,
        inserted = created.len(),
        "Imported portfolio CSV"
    );
    Ok(created)
}

/// Imports the CSV at `path` when the portfolio table is empty.
///
/// Returns the number of items inserted; `0` when the table already had rows.
pub async fn seed_if_empty(pool: &SqlitePool, path: &Path) -> Result<usize, PortfolioImportError> {
    if PortfolioItem::count(pool).await? > 0 {
        tracing::debug!(path = %path.display(), "Portfolio already seeded");
        return Ok(0);
    }

    let text = tokio::fs::read_to_string(path).await?;
    let created = import_csv(pool, &text).await?;
    info!(path = %path.display(), count = created.len(), "Seeded portfolio");
    Ok(created.len())
}

#[cfg(test)]
mod tests {
    use db::DBService;

    use super::*;

    const CSV: &str = "\
title,type,date,description,url,image_url,tags
Night Swim,video,07/2025,Short film,https://example.com/swim,https://example.com/swim.jpg,film; water
Palette Tool,tool,2024-03,Extracts colors,https://example.com/palette,,
";

    #[test]
    fn rows_yield_placeholder_plus_drafts() {
        let items = parse_csv_to_portfolio_items(CSV).unwrap();
        assert_eq!(items.len(), 3);
        assert!(items[0].is_placeholder());

        assert_eq!(items[1].title, "Night Swim");
        assert_eq!(items[1].item_type, PortfolioItemType::Video);
        assert_eq!(items[1].date.as_deref(), Some("07/2025"));
        assert_eq!(
            items[1].image_url.as_deref(),
            Some("https://example.com/swim.jpg")
        );
        assert_eq!(items[1].tags.as_deref(), Some("film;water"));

        assert_eq!(items[2].item_type, PortfolioItemType::Tool);
        assert_eq!(items[2].image_url, None);
        assert_eq!(items[2].tags, None);
    }

    #[test]
    fn header_only_yields_only_the_placeholder() {
        let items = parse_csv_to_portfolio_items("title,type,date,description,url\n").unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn missing_headers_are_named() {
        let err = parse_csv_to_portfolio_items("title,date\nA,2020\n").unwrap_err();
        match err {
            PortfolioImportError::MissingHeaders(missing) => {
                assert_eq!(missing, vec!["type", "description", "url"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn headers_are_matched_loosely() {
        let text = "Title, Type ,DATE,Description,URL,Image URL\nA,Photo,2020,d,u,i\n";
        let items = parse_csv_to_portfolio_items(text).unwrap();
        assert_eq!(items[1].item_type, PortfolioItemType::Photo);
        assert_eq!(items[1].image_url.as_deref(), Some("i"));
    }

    #[test]
    fn unknown_type_names_the_row() {
        let text = "title,type,date,description,url\nA,video,,,\nB,sculpture,,,\n";
        let err = parse_csv_to_portfolio_items(text).unwrap_err();
        assert!(matches!(
            err,
            PortfolioImportError::InvalidType { row: 3, ref value } if value == "sculpture"
        ));
    }

    #[tokio::test]
    async fn import_skips_placeholder_and_seed_runs_once() {
        let db = DBService::new_in_memory().await.unwrap();

        let created = import_csv(&db.pool, CSV).await.unwrap();
        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|item| !item.title.is_empty()));

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("seed.csv");
        std::fs::write(&path, CSV).unwrap();
        assert_eq!(seed_if_empty(&db.pool, &path).await.unwrap(), 0);
        assert_eq!(PortfolioItem::count(&db.pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn seed_fills_an_empty_table() {
        let db = DBService::new_in_memory().await.unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("seed.csv");
        std::fs::write(&path, CSV).unwrap();

        assert_eq!(seed_if_empty(&db.pool, &path).await.unwrap(), 2);
    }
}
