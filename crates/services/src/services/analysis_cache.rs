//! Size- and age-bounded cache for media-insight analyses.
//!
//! Writes prune oldest-first once the store grows past the byte cap. Reads
//! treat an entry as a miss (and drop it) when it is older than the expiry
//! window or when the source file changed after the entry was written. There
//! is no access-time tracking: a frequently read entry is evicted as soon as
//! it is the oldest.

use std::{sync::Arc, time::Duration};

use db::store::{Payload, StoreConfig, StoreError, StoreGateway, StoreLocation, StoredRecord};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use super::clock::{Clock, system_clock};

pub const DATABASE: &str = "media-insight-cache";
pub const STORE: &str = "analyses";
pub const VERSION: u32 = 1;

pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    pub max_bytes: u64,
    pub max_age: Duration,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedAnalysis {
    /// Source file modification time (epoch ms) the analysis was made from.
    last_modified: Option<i64>,
    analysis: serde_json::Value,
}

#[derive(Clone)]
pub struct AnalysisCache {
    gateway: StoreGateway,
    policy: EvictionPolicy,
    clock: Arc<dyn Clock>,
}

impl AnalysisCache {
    pub fn new(location: StoreLocation) -> Result<Self, StoreError> {
        Self::with_policy(location, EvictionPolicy::default(), system_clock())
    }

    pub fn with_policy(
        location: StoreLocation,
        policy: EvictionPolicy,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        let gateway = StoreGateway::new(StoreConfig::new(DATABASE, STORE, VERSION), location)?;
        Ok(Self {
            gateway,
            policy,
            clock,
        })
    }

    /// Looks up `key`. A stale entry is deleted and reported as a miss.
    ///
    /// `last_modified` is the source file's current modification time; when it
    /// is newer than the one recorded with the entry, the entry is stale.
    pub async fn get<T: DeserializeOwned>(
        &self,
        key: &str,
        last_modified: Option<i64>,
    ) -> Result<Option<T>, StoreError> {
        let Some(record) = self.gateway.get(key).await? else {
            return Ok(None);
        };

        let age_ms = self.clock.now_millis().saturating_sub(record.created_at);
        let expired = age_ms > self.policy.max_age.as_millis() as i64;

        let cached: CachedAnalysis = match record.payload_as() {
            Ok(cached) => cached,
            Err(e) => {
                debug!(key = %key, error = %e, "Dropping unreadable analysis");
                self.gateway.delete_by_id(key).await?;
                return Ok(None);
            }
        };

        let source_changed = match (last_modified, cached.last_modified) {
            (Some(current), Some(recorded)) => current > recorded,
            (Some(_), None) => true,
            _ => false,
        };

        if expired || source_changed {
            debug!(key = %key, expired, source_changed, "Analysis cache miss, removing entry");
            self.gateway.delete_by_id(key).await?;
            return Ok(None);
        }

        match serde_json::from_value(cached.analysis) {
            Ok(value) => Ok(Some(value)),
            Err(e) => Err(StoreError::CorruptRecord {
                id: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Writes `analysis` under `key`, then evicts oldest entries until the
    /// store fits the byte cap. Returns how many entries were evicted.
    pub async fn put<T: Serialize>(
        &self,
        key: &str,
        label: &str,
        analysis: &T,
        last_modified: Option<i64>,
    ) -> Result<usize, StoreError> {
        let analysis = serde_json::to_value(analysis)
            .map_err(|e| StoreError::StorageWriteFailed(e.to_string()))?;
        let payload = Payload::json(&CachedAnalysis {
            last_modified,
            analysis,
        })?;
        let record = StoredRecord::new(key, label, self.clock.now_millis(), payload);

        self.gateway.put(&record).await?;
        self.prune().await
    }

    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.gateway.delete_by_id(key).await
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.gateway.clear().await
    }

    async fn prune(&self) -> Result<usize, StoreError> {
        let entries = self.gateway.entry_sizes().await?;
        let mut total: u64 = entries.iter().map(|e| e.size.max(0) as u64).sum();
        if total <= self.policy.max_bytes {
            return Ok(0);
        }

        let mut evicted = 0;
        for entry in entries {
            if total <= self.policy.max_bytes {
                break;
            }
            self.gateway.delete_by_id(&entry.id).await?;
            total = total.saturating_sub(entry.size.max(0) as u64);
            evicted += 1;
        }

        info!(
            evicted,
            remaining_bytes = total,
            max_bytes = self.policy.max_bytes,
            "Pruned analysis cache"
        );
        Ok(evicted)
    }
}
