//! Media insight analysis, cached per source file.

use db::store::StoreError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};
use ts_rs::TS;

use super::{
    ai_client::{AiClient, AiClientError},
    analysis_cache::AnalysisCache,
};

const SYSTEM_PROMPT: &str = "You catalogue media files for a portfolio archive. Reply with a \
single JSON object {\"summary\": string, \"tags\": string[]} and nothing else. The summary is one \
or two sentences. Tags are short lowercase keywords.";

#[derive(Debug, Error)]
pub enum MediaInsightError {
    #[error(transparent)]
    Ai(#[from] AiClientError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("file name must not be empty")]
    MissingFileName,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct AnalyzeMediaRequest {
    pub file_name: String,
    pub mime_type: Option<String>,
    /// Whatever the caller could extract: caption, transcript, EXIF dump.
    pub description: String,
    /// Source file modification time in epoch milliseconds.
    pub last_modified: Option<i64>,
}

impl AnalyzeMediaRequest {
    /// Cache key for this request as seen by `owner`.
    ///
    /// Entries never cross owners, and a different file uploaded under the
    /// same name gets its own entry.
    pub fn cache_key(&self, owner: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.file_name.trim().as_bytes());
        hasher.update([0]);
        hasher.update(self.mime_type.as_deref().unwrap_or_default().as_bytes());
        hasher.update([0]);
        hasher.update(self.description.as_bytes());
        format!("{owner}:{}", hex::encode(hasher.finalize()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Analysis {
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
pub struct MediaInsight {
    #[serde(flatten)]
    pub analysis: Analysis,
    pub cached: bool,
}

#[derive(Clone)]
pub struct MediaInsightService {
    cache: AnalysisCache,
    ai: Option<AiClient>,
}

impl MediaInsightService {
    pub fn new(cache: AnalysisCache, ai: Option<AiClient>) -> Self {
        Self { cache, ai }
    }

    /// Returns `owner`'s cached analysis for the file when it is still fresh,
    /// otherwise asks the model and caches the answer.
    ///
    /// Cache failures never fail the request: a broken read is a miss and a
    /// broken write is logged.
    pub async fn analyze(
        &self,
        owner: &str,
        request: AnalyzeMediaRequest,
    ) -> Result<MediaInsight, MediaInsightError> {
        let file = request.file_name.trim();
        if file.is_empty() {
            return Err(MediaInsightError::MissingFileName);
        }
        let key = request.cache_key(owner);

        match self.cache.get::<Analysis>(&key, request.last_modified).await {
            Ok(Some(analysis)) => {
                debug!(%file, %owner, "Media insight served from cache");
                return Ok(MediaInsight {
                    analysis,
                    cached: true,
                });
            }
            Ok(None) => {}
            Err(e) => warn!(%file, error = %e, "Analysis cache read failed"),
        }

        let ai = self.ai.as_ref().ok_or(AiClientError::NotConfigured)?;
        let prompt = format!(
            "File: {}\nType: {}\n\n{}",
            file,
            request.mime_type.as_deref().unwrap_or("unknown"),
            request.description
        );
        let analysis: Analysis = ai.ask_json(&prompt, Some(SYSTEM_PROMPT)).await?;

        match self
            .cache
            .put(&key, file, &analysis, request.last_modified)
            .await
        {
            Ok(evicted) => info!(%file, evicted, "Cached media insight"),
            Err(e) => warn!(%file, error = %e, "Analysis cache write failed"),
        }

        Ok(MediaInsight {
            analysis,
            cached: false,
        })
    }
}
