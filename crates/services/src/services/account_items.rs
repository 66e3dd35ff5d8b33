//! Everything a signed-in user has saved, as one list.
//!
//! Each record type is a variant of [`AccountItem`]; the account page shows a
//! title and subtitle for every item, produced by the summarizer registered
//! for its [`AccountItemKind`] in [`SUMMARIZERS`].

use chrono::{DateTime, Utc};
use db::models::{
    background_removal_job::BackgroundRemovalJob, color_palette::ColorPalette, link::Link,
    nylon_fabric_design::NylonFabricDesign,
};
use serde::Serialize;
use sqlx::SqlitePool;
use strum_macros::{Display, EnumString};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, TS, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccountItem {
    Link(Link),
    BackgroundRemovalJob(BackgroundRemovalJob),
    ColorPalette(ColorPalette),
    NylonFabricDesign(NylonFabricDesign),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccountItemKind {
    Link,
    BackgroundRemovalJob,
    ColorPalette,
    NylonFabricDesign,
}

#[derive(Debug, Clone, Serialize, TS, PartialEq, Eq)]
pub struct ItemSummary {
    pub title: String,
    pub subtitle: Option<String>,
}

/// An item plus its display summary, as sent to the account page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AccountItemView {
    #[serde(flatten)]
    pub item: AccountItem,
    pub summary: ItemSummary,
}

type Summarizer = fn(&AccountItem) -> ItemSummary;

pub static SUMMARIZERS: &[(AccountItemKind, Summarizer)] = &[
    (AccountItemKind::Link, summarize_link),
    (AccountItemKind::BackgroundRemovalJob, summarize_job),
    (AccountItemKind::ColorPalette, summarize_palette),
    (AccountItemKind::NylonFabricDesign, summarize_design),
];

impl AccountItem {
    pub fn kind(&self) -> AccountItemKind {
        match self {
            AccountItem::Link(_) => AccountItemKind::Link,
            AccountItem::BackgroundRemovalJob(_) => AccountItemKind::BackgroundRemovalJob,
            AccountItem::ColorPalette(_) => AccountItemKind::ColorPalette,
            AccountItem::NylonFabricDesign(_) => AccountItemKind::NylonFabricDesign,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            AccountItem::Link(l) => l.created_at,
            AccountItem::BackgroundRemovalJob(j) => j.created_at,
            AccountItem::ColorPalette(p) => p.created_at,
            AccountItem::NylonFabricDesign(d) => d.created_at,
        }
    }

    pub fn summary(&self) -> ItemSummary {
        let kind = self.kind();
        SUMMARIZERS
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, summarize)| summarize(self))
            .unwrap_or_else(|| ItemSummary {
                title: kind.to_string(),
                subtitle: None,
            })
    }

    pub fn into_view(self) -> AccountItemView {
        let summary = self.summary();
        AccountItemView {
            item: self,
            summary,
        }
    }
}

fn summarize_link(item: &AccountItem) -> ItemSummary {
    let AccountItem::Link(link) = item else {
        return mismatched(item);
    };
    ItemSummary {
        title: link.title.clone(),
        subtitle: Some(link.url.clone()),
    }
}

fn summarize_job(item: &AccountItem) -> ItemSummary {
    let AccountItem::BackgroundRemovalJob(job) = item else {
        return mismatched(item);
    };
    ItemSummary {
        title: job.file_name.clone(),
        subtitle: Some(format!("Background removal: {}", job.status)),
    }
}

fn summarize_palette(item: &AccountItem) -> ItemSummary {
    let AccountItem::ColorPalette(palette) = item else {
        return mismatched(item);
    };
    let count = palette.colors.len();
    ItemSummary {
        title: palette.name.clone(),
        subtitle: Some(format!(
            "{count} color{}",
            if count == 1 { "" } else { "s" }
        )),
    }
}

fn summarize_design(item: &AccountItem) -> ItemSummary {
    let AccountItem::NylonFabricDesign(design) = item else {
        return mismatched(item);
    };
    let first_line = design
        .design_text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| l.chars().take(80).collect::<String>());
    ItemSummary {
        title: design.project_name.clone(),
        subtitle: first_line,
    }
}

fn mismatched(item: &AccountItem) -> ItemSummary {
    tracing::warn!(kind = %item.kind(), "Summarizer registered for the wrong kind");
    ItemSummary {
        title: item.kind().to_string(),
        subtitle: None,
    }
}

/// Loads every item owned by `user_id`, newest first.
pub async fn load_account_items(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<AccountItemView>, sqlx::Error> {
    let (links, jobs, palettes, designs) = tokio::try_join!(
        Link::find_by_user(pool, user_id),
        BackgroundRemovalJob::find_by_user(pool, user_id),
        ColorPalette::find_by_user(pool, user_id),
        NylonFabricDesign::find_by_user(pool, user_id),
    )?;

    let mut items: Vec<AccountItem> = links
        .into_iter()
        .map(AccountItem::Link)
        .chain(jobs.into_iter().map(AccountItem::BackgroundRemovalJob))
        .chain(palettes.into_iter().map(AccountItem::ColorPalette))
        .chain(designs.into_iter().map(AccountItem::NylonFabricDesign))
        .collect();
    items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

    Ok(items.into_iter().map(AccountItem::into_view).collect())
}

#[cfg(test)]
mod tests {
    use db::{
        DBService,
        models::{
            background_removal_job::CreateBackgroundRemovalJob, color_palette::CreateColorPalette,
            link::CreateLink,
        },
    };
    use uuid::Uuid;

    use super::*;

    #[test]
    fn every_kind_has_a_summarizer() {
        for kind in [
            AccountItemKind::Link,
            AccountItemKind::BackgroundRemovalJob,
            AccountItemKind::ColorPalette,
            AccountItemKind::NylonFabricDesign,
        ] {
            assert_eq!(
                SUMMARIZERS.iter().filter(|(k, _)| *k == kind).count(),
                1,
                "{kind}"
            );
        }
    }

    #[tokio::test]
    async fn items_are_tagged_summarized_and_newest_first() {
        let db = DBService::new_in_memory().await.unwrap();
        let user = "user-1";

        BackgroundRemovalJob::create(
            &db.pool,
            Uuid::new_v4(),
            user,
            &CreateBackgroundRemovalJob {
                file_name: "cat.png".to_string(),
            },
        )
        .await
        .unwrap();
        // created_at has millisecond resolution.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        ColorPalette::create(
            &db.pool,
            Uuid::new_v4(),
            user,
            &CreateColorPalette {
                name: "Sunset".to_string(),
                colors: vec!["#ff0000".to_string(), "#ffaa00".to_string()],
                source_file_name: None,
            },
        )
        .await
        .unwrap();
        Link::create(
            &db.pool,
            Uuid::new_v4(),
            "someone-else",
            &CreateLink {
                title: "Hidden".to_string(),
                url: "https://example.com".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();

        let items = load_account_items(&db.pool, user).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item.kind(), AccountItemKind::ColorPalette);
        assert_eq!(items[0].summary.title, "Sunset");
        assert_eq!(items[0].summary.subtitle.as_deref(), Some("2 colors"));
        assert_eq!(
            items[1].summary.subtitle.as_deref(),
            Some("Background removal: pending")
        );

        let value = serde_json::to_value(&items[0]).unwrap();
        assert_eq!(value["type"], "color_palette");
        assert_eq!(value["name"], "Sunset");
        assert_eq!(value["summary"]["title"], "Sunset");
    }
}
