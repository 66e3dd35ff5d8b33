use std::sync::Arc;

use axum::{Router, http::HeaderValue};
use db::{
    DBService,
    store::{StoreError, StoreLocation},
};
use services::services::{
    ai_client::{AiClient, AiClientError},
    analysis_cache::AnalysisCache,
    chat_assistant::ChatAssistant,
    media_insight::MediaInsightService,
};
use thiserror::Error;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use config::ServerConfig;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ai(#[from] AiClientError),
    #[error("invalid CORS origin: {0}")]
    CorsOrigin(String),
}

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    jwt_secret: Option<Arc<str>>,
    local_stores_enabled: bool,
    media_insight: MediaInsightService,
    assistant: Option<ChatAssistant>,
}

impl AppState {
    pub fn from_config(db: DBService, config: &ServerConfig) -> Result<Self, StartupError> {
        let ai = config.ai.clone().map(AiClient::new).transpose()?;
        let cache = AnalysisCache::new(config.local_stores.clone())?;

        Ok(Self {
            db,
            jwt_secret: config.jwt_secret.as_deref().map(Arc::from),
            local_stores_enabled: config.local_stores != StoreLocation::Disabled,
            assistant: ai.clone().map(ChatAssistant::new),
            media_insight: MediaInsightService::new(cache, ai),
        })
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn jwt_secret(&self) -> Option<&str> {
        self.jwt_secret.as_deref()
    }

    pub fn local_stores_enabled(&self) -> bool {
        self.local_stores_enabled
    }

    pub fn media_insight(&self) -> &MediaInsightService {
        &self.media_insight
    }

    pub fn assistant(&self) -> Option<&ChatAssistant> {
        self.assistant.as_ref()
    }
}

/// Allows `origin` when given, any origin otherwise.
pub fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, StartupError> {
    let Some(origin) = origin else {
        return Ok(CorsLayer::permissive());
    };
    let origin = HeaderValue::from_str(origin)
        .map_err(|_| StartupError::CorsOrigin(origin.to_string()))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

pub fn app(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .nest("/api", routes::router(&state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
