use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sqlx::FromRow;

use super::StoreError;

const KIND_BLOB: &str = "blob";
const KIND_JSON: &str = "json";

/// Opaque body of a stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Payload {
    Blob(Vec<u8>),
    Json(serde_json::Value),
}

impl Payload {
    /// Serializes any `Serialize` value into a JSON payload.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, StoreError> {
        serde_json::to_value(value)
            .map(Payload::Json)
            .map_err(|e| StoreError::StorageWriteFailed(e.to_string()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Blob(_) => KIND_BLOB,
            Payload::Json(_) => KIND_JSON,
        }
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, StoreError> {
        match self {
            Payload::Blob(bytes) => Ok(bytes.clone()),
            Payload::Json(value) => serde_json::to_vec(value)
                .map_err(|e| StoreError::StorageWriteFailed(e.to_string())),
        }
    }

    pub(crate) fn decode(kind: &str, bytes: Vec<u8>) -> Result<Self, String> {
        match kind {
            KIND_BLOB => Ok(Payload::Blob(bytes)),
            KIND_JSON => serde_json::from_slice(&bytes)
                .map(Payload::Json)
                .map_err(|e| e.to_string()),
            other => Err(format!("unknown payload kind '{other}'")),
        }
    }
}

/// One entry in a keyed store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub id: String,
    pub label: String,
    /// Epoch milliseconds, stamped when the record is written.
    pub created_at: i64,
    pub payload: Payload,
}

impl StoredRecord {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        created_at: i64,
        payload: Payload,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            created_at,
            payload,
        }
    }

    /// Deserializes a JSON payload into `T`. Blob payloads are an error.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        match &self.payload {
            Payload::Json(value) => {
                serde_json::from_value(value.clone()).map_err(|e| StoreError::CorruptRecord {
                    id: self.id.clone(),
                    reason: e.to_string(),
                })
            }
            Payload::Blob(_) => Err(StoreError::CorruptRecord {
                id: self.id.clone(),
                reason: "expected a json payload, found a blob".to_string(),
            }),
        }
    }
}

/// Column layout of every store table.
#[derive(Debug, FromRow)]
pub(crate) struct StoredRow {
    pub id: String,
    pub label: String,
    pub created_at: i64,
    pub payload_kind: String,
    pub payload: Vec<u8>,
}

impl StoredRow {
    pub fn from_record(record: &StoredRecord) -> Result<Self, StoreError> {
        Ok(Self {
            id: record.id.clone(),
            label: record.label.clone(),
            created_at: record.created_at,
            payload_kind: record.payload.kind().to_string(),
            payload: record.payload.encode()?,
        })
    }
}

impl TryFrom<StoredRow> for StoredRecord {
    type Error = StoreError;

    fn try_from(row: StoredRow) -> Result<Self, Self::Error> {
        let payload =
            Payload::decode(&row.payload_kind, row.payload).map_err(|reason| {
                StoreError::CorruptRecord {
                    id: row.id.clone(),
                    reason,
                }
            })?;
        Ok(StoredRecord {
            id: row.id,
            label: row.label,
            created_at: row.created_at,
            payload,
        })
    }
}
