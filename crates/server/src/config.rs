use std::{net::SocketAddr, path::PathBuf, time::Duration};

use db::store::StoreLocation;
use services::services::ai_client::{self, AiConfig};
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/laundromat.sqlite";
pub const DEFAULT_LOCAL_STORE_DIR: &str = "data/local-stores";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Authenticated routes answer 401 when unset.
    pub jwt_secret: Option<String>,
    pub local_stores: StoreLocation,
    /// `None` leaves the assistant and media-insight routes unconfigured.
    pub ai: Option<AiConfig>,
    pub portfolio_seed_csv: Option<PathBuf>,
    pub cors_origin: Option<String>,
}

impl ServerConfig {
    /// Reads the process environment. Call after `dotenvy::dotenv()`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = var("DATABASE_URL")
            .or_else(|| var("SQLITE_PATH").map(|path| format!("sqlite://{path}")))
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let port = match var("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        // Set-but-empty disables the stores, unset falls back to the default.
        let local_stores = match lookup("LOCAL_STORE_DIR") {
            Some(dir) => StoreLocation::from_path(dir.trim()),
            None => StoreLocation::Directory(PathBuf::from(DEFAULT_LOCAL_STORE_DIR)),
        };

        let base_url = var("AI_BASE_URL").or_else(|| var("LM_STUDIO_BASE_URL"));
        let api_key = var("OPENAI_API_KEY").or_else(|| var("GEMINI_API_KEY"));
        let ai = if base_url.is_some() || api_key.is_some() {
            let timeout = match var("AI_TIMEOUT_SECS") {
                Some(value) => Duration::from_secs(value.parse().map_err(|_| {
                    ConfigError::Invalid {
                        name: "AI_TIMEOUT_SECS",
                        value,
                    }
                })?),
                None => ai_client::DEFAULT_TIMEOUT,
            };
            Some(AiConfig {
                base_url: base_url.unwrap_or_else(|| ai_client::DEFAULT_BASE_URL.to_string()),
                api_key,
                model: var("AI_MODEL").unwrap_or_else(|| ai_client::DEFAULT_MODEL.to_string()),
                timeout,
            })
        } else {
            None
        };

        Ok(Self {
            database_url,
            host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            jwt_secret: var("JWT_SECRET"),
            local_stores,
            ai,
            portfolio_seed_csv: var("PORTFOLIO_SEED_CSV").map(PathBuf::from),
            cors_origin: var("CORS_ORIGIN"),
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::Invalid {
            name: "HOST",
            value: addr,
        })
    }
}
