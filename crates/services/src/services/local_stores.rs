//! Typed keyed stores for the tool pages.
//!
//! Each tool keeps its finished results in its own embedded store so they
//! survive a restart without a round trip to the API. A [`RecordAdapter`]
//! names the store and maps the tool's native shapes to and from
//! [`StoredRecord`]; [`LocalStore`] does the rest.

use std::{marker::PhantomData, path::Path, sync::Arc};

use db::store::{Payload, StoreConfig, StoreError, StoreGateway, StoreLocation, StoredRecord};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::clock::{Clock, system_clock};

/// Maps one tool's result shape onto the generic record shape.
pub trait RecordAdapter {
    /// What the tool hands over to be saved.
    type Input;
    /// What the tool reads back.
    type Entry;

    const DATABASE: &'static str;
    const STORE: &'static str;
    const VERSION: u32;

    fn to_record(id: String, created_at: i64, input: Self::Input) -> Result<StoredRecord, StoreError>;

    fn from_record(record: StoredRecord) -> Result<Self::Entry, StoreError>;

    fn store_config() -> StoreConfig {
        StoreConfig::new(Self::DATABASE, Self::STORE, Self::VERSION)
    }
}

/// A keyed store specialized to one adapter.
pub struct LocalStore<A: RecordAdapter> {
    gateway: StoreGateway,
    clock: Arc<dyn Clock>,
    _adapter: PhantomData<fn() -> A>,
}

impl<A: RecordAdapter> Clone for LocalStore<A> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            clock: self.clock.clone(),
            _adapter: PhantomData,
        }
    }
}

impl<A: RecordAdapter> LocalStore<A> {
    pub fn new(location: StoreLocation) -> Result<Self, StoreError> {
        Self::with_clock(location, system_clock())
    }

    pub fn in_dir(root: &Path) -> Result<Self, StoreError> {
        Self::new(StoreLocation::Directory(root.to_path_buf()))
    }

    pub fn with_clock(location: StoreLocation, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        Ok(Self {
            gateway: StoreGateway::new(A::store_config(), location)?,
            clock,
            _adapter: PhantomData,
        })
    }

    pub async fn is_available(&self) -> bool {
        self.gateway.is_available().await
    }

    /// Saves `input` under a fresh id and returns that id.
    pub async fn save(&self, input: A::Input) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.save_with_id(id.clone(), input).await?;
        Ok(id)
    }

    /// Saves `input` under `id`, replacing whatever was stored there.
    pub async fn save_with_id(&self, id: String, input: A::Input) -> Result<(), StoreError> {
        let record = A::to_record(id, self.clock.now_millis(), input)?;
        self.gateway.put(&record).await
    }

    /// Every saved entry, newest first. Records the adapter cannot read are
    /// skipped.
    pub async fn load_all(&self) -> Result<Vec<A::Entry>, StoreError> {
        let records = self.gateway.get_all().await?;
        Ok(records
            .into_iter()
            .filter_map(|record| match A::from_record(record) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(store = A::STORE, error = %e, "Skipping unreadable entry");
                    None
                }
            })
            .collect())
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.gateway.delete_by_id(id).await
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.gateway.clear().await
    }
}

// Background removal

pub struct BackgroundRemovalAdapter;

#[derive(Debug, Clone)]
pub struct BackgroundRemovalInput {
    pub file_name: String,
    /// Data URL of the original upload; shown beside the result while the
    /// page is open but not persisted.
    pub source_data_url: Option<String>,
    pub result_blob: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundRemovalEntry {
    pub id: String,
    pub file_name: String,
    pub result_blob: Vec<u8>,
    pub created_at: i64,
}

impl RecordAdapter for BackgroundRemovalAdapter {
    type Input = BackgroundRemovalInput;
    type Entry = BackgroundRemovalEntry;

    const DATABASE: &'static str = "background-removal";
    const STORE: &'static str = "results";
    const VERSION: u32 = 1;

    fn to_record(id: String, created_at: i64, input: Self::Input) -> Result<StoredRecord, StoreError> {
        Ok(StoredRecord::new(
            id,
            input.file_name,
            created_at,
            Payload::Blob(input.result_blob),
        ))
    }

    fn from_record(record: StoredRecord) -> Result<Self::Entry, StoreError> {
        match record.payload {
            Payload::Blob(result_blob) => Ok(BackgroundRemovalEntry {
                id: record.id,
                file_name: record.label,
                result_blob,
                created_at: record.created_at,
            }),
            Payload::Json(_) => Err(StoreError::CorruptRecord {
                id: record.id,
                reason: "expected an image blob".to_string(),
            }),
        }
    }
}

pub type BackgroundRemovalStore = LocalStore<BackgroundRemovalAdapter>;

// Color palettes

pub struct ColorPaletteAdapter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteInput {
    pub name: String,
    pub colors: Vec<String>,
    pub source_file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaletteEntry {
    pub id: String,
    pub name: String,
    pub colors: Vec<String>,
    pub source_file_name: Option<String>,
    pub created_at: i64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PalettePayload {
    colors: Vec<String>,
    source_file_name: Option<String>,
}

impl RecordAdapter for ColorPaletteAdapter {
    type Input = PaletteInput;
    type Entry = PaletteEntry;

    const DATABASE: &'static str = "color-palettes";
    const STORE: &'static str = "palettes";
    const VERSION: u32 = 1;

    fn to_record(id: String, created_at: i64, input: Self::Input) -> Result<StoredRecord, StoreError> {
        let payload = Payload::json(&PalettePayload {
            colors: input.colors,
            source_file_name: input.source_file_name,
        })?;
        Ok(StoredRecord::new(id, input.name, created_at, payload))
    }

    fn from_record(record: StoredRecord) -> Result<Self::Entry, StoreError> {
        let payload: PalettePayload = record.payload_as()?;
        Ok(PaletteEntry {
            id: record.id,
            name: record.label,
            colors: payload.colors,
            source_file_name: payload.source_file_name,
            created_at: record.created_at,
        })
    }
}

pub type ColorPaletteStore = LocalStore<ColorPaletteAdapter>;

// Nylon fabric designs

pub struct NylonFabricAdapter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NylonDesignInput {
    pub project_name: String,
    pub design_text: String,
    pub visuals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NylonDesignEntry {
    pub id: String,
    pub project_name: String,
    pub design_text: String,
    pub visuals: Vec<String>,
    pub created_at: i64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NylonDesignPayload {
    design_text: String,
    visuals: Vec<String>,
}

impl RecordAdapter for NylonFabricAdapter {
    type Input = NylonDesignInput;
    type Entry = NylonDesignEntry;

    const DATABASE: &'static str = "nylon-fabric-designs";
    const STORE: &'static str = "designs";
    const VERSION: u32 = 1;

    fn to_record(id: String, created_at: i64, input: Self::Input) -> Result<StoredRecord, StoreError> {
        let payload = Payload::json(&NylonDesignPayload {
            design_text: input.design_text,
            visuals: input.visuals,
        })?;
        Ok(StoredRecord::new(id, input.project_name, created_at, payload))
    }

    fn from_record(record: StoredRecord) -> Result<Self::Entry, StoreError> {
        let payload: NylonDesignPayload = record.payload_as()?;
        Ok(NylonDesignEntry {
            id: record.id,
            project_name: record.label,
            design_text: payload.design_text,
            visuals: payload.visuals,
            created_at: record.created_at,
        })
    }
}

pub type NylonFabricStore = LocalStore<NylonFabricAdapter>;

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::services::clock::ManualClock;

    fn palette(name: &str) -> PaletteInput {
        PaletteInput {
            name: name.to_string(),
            colors: vec!["#102030".to_string(), "#a0b0c0".to_string()],
            source_file_name: Some(format!("{name}.jpg")),
        }
    }

    #[tokio::test]
    async fn palette_round_trip_is_newest_first() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::new(1_000);
        let store = ColorPaletteStore::with_clock(
            StoreLocation::Directory(dir.path().to_path_buf()),
            clock.clone(),
        )
        .unwrap();

        let first = store.save(palette("dawn")).await.unwrap();
        clock.advance(500);
        let second = store.save(palette("dusk")).await.unwrap();

        let entries = store.load_all().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, second);
        assert_eq!(entries[0].name, "dusk");
        assert_eq!(entries[0].created_at, 1_500);
        assert_eq!(entries[1].id, first);
        assert_eq!(entries[1].colors, vec!["#102030", "#a0b0c0"]);
        assert_eq!(entries[1].source_file_name.as_deref(), Some("dawn.jpg"));
    }

    #[tokio::test]
    async fn background_removal_keeps_result_bytes() {
        let dir = TempDir::new().unwrap();
        let store = BackgroundRemovalStore::in_dir(dir.path()).unwrap();

        let id = store
            .save(BackgroundRemovalInput {
                file_name: "cat.png".to_string(),
                source_data_url: Some("data:image/png;base64,AAAA".to_string()),
                result_blob: vec![0x89, b'P', b'N', b'G'],
            })
            .await
            .unwrap();

        let entries = store.load_all().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, id);
        assert_eq!(entries[0].file_name, "cat.png");
        assert_eq!(entries[0].result_blob, vec![0x89, b'P', b'N', b'G']);

        store.delete(&id).await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreadable_entry_does_not_hide_the_rest() {
        let dir = TempDir::new().unwrap();
        let store = BackgroundRemovalStore::in_dir(dir.path()).unwrap();
        let id = store
            .save(BackgroundRemovalInput {
                file_name: "dog.png".to_string(),
                source_data_url: None,
                result_blob: vec![1, 2, 3],
            })
            .await
            .unwrap();

        let raw = StoreGateway::new(
            BackgroundRemovalAdapter::store_config(),
            StoreLocation::Directory(dir.path().to_path_buf()),
        )
        .unwrap();
        raw.put(&StoredRecord::new(
            "stray",
            "stray.json",
            0,
            Payload::json(&serde_json::json!({ "not": "an image" })).unwrap(),
        ))
        .await
        .unwrap();

        let entries = store.load_all().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, id);
    }

    #[tokio::test]
    async fn save_with_id_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = NylonFabricStore::in_dir(dir.path()).unwrap();

        let design = |text: &str| NylonDesignInput {
            project_name: "Tote".to_string(),
            design_text: text.to_string(),
            visuals: vec![],
        };
        store
            .save_with_id("tote".to_string(), design("v1"))
            .await
            .unwrap();
        store
            .save_with_id("tote".to_string(), design("v2"))
            .await
            .unwrap();

        let entries = store.load_all().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].design_text, "v2");

        store.clear().await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn disabled_location_keeps_tool_working() {
        let store = ColorPaletteStore::new(StoreLocation::Disabled).unwrap();
        assert!(!store.is_available().await);
        store.save(palette("noop")).await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());
    }
}
