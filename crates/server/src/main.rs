use std::path::Path;

use anyhow::Context;
use db::DBService;
use server::{AppState, app, config::ServerConfig, cors_layer};
use services::services::portfolio_import;
use tracing::{info, warn};
use utils::logging::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    ensure_database_dir(&config.database_url)?;

    let db = DBService::new(&config.database_url)
        .await
        .with_context(|| format!("opening {}", config.database_url))?;

    if let Some(path) = &config.portfolio_seed_csv {
        match portfolio_import::seed_if_empty(&db.pool, path).await {
            Ok(0) => {}
            Ok(count) => info!(count, path = %path.display(), "Seeded portfolio from CSV"),
            Err(e) => warn!(error = %e, path = %path.display(), "Portfolio seed failed"),
        }
    }

    if config.jwt_secret.is_none() {
        warn!("JWT_SECRET is not set; authenticated routes will reject every request");
    }
    if config.ai.is_none() {
        info!("No AI provider configured; assistant and media insight routes are disabled");
    }

    let cors = cors_layer(config.cors_origin.as_deref())?;
    let state = AppState::from_config(db, &config)?;
    let addr = config.bind_addr()?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Server listening");

    axum::serve(listener, app(state, cors))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// SQLite creates the file but not its directory.
fn ensure_database_dir(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}
