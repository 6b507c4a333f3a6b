//! # marquee-server
//!
//! API server for the Marquee content platform.
//!
//! This binary provides:
//! - **Threaded comments** on subjects (images, posts, articles), with
//!   like/unlike counters backed by an authoritative relation set
//! - **Film & celebrity catalogue** populated from an external metadata
//!   provider via an admin-triggered import pipeline
//! - **REST API** (axum) with structured JSON errors
//! - **Per-IP rate limiting** to protect against abuse

mod api;
mod auth;
mod config;
mod error;
mod importer;
mod rate_limit;
mod state;

use std::sync::{Arc, Mutex};

use tracing::info;
use tracing_subscriber::EnvFilter;

use marquee_store::Database;
use marquee_tmdb::TmdbClient;

use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,marquee_server=debug")),
        )
        .init();

    info!("Starting Marquee server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        instance = %config.instance_name,
        admin_enabled = config.admin_token.is_some(),
        provider = %config.tmdb_base_url,
        "Loaded configuration"
    );

    if config.tmdb_api_key.is_empty() {
        tracing::warn!("TMDB_API_KEY not set; film imports will fail until configured");
    }

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // SQLite store (platform data dir unless DB_PATH overrides it)
    let database = match &config.db_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };

    // Metadata provider client
    let provider = Arc::new(TmdbClient::with_base_url(
        config.tmdb_api_key.clone(),
        config.tmdb_base_url.clone(),
    ));

    // Rate limiter: 10 req/s sustained, burst of 30
    let rate_limiter = RateLimiter::default();

    // Application state for the HTTP API
    let app_state = AppState {
        db: Arc::new(Mutex::new(database)),
        provider,
        rate_limiter: rate_limiter.clone(),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic rate limiter cleanup (every 5 minutes, evict buckets idle >10 min)
    let rl = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rl.purge_stale(600.0).await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    // tokio::select! ensures that if either the HTTP server or a shutdown
    // signal arrives, we exit cleanly.
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
