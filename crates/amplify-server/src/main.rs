//! # amplify-server
//!
//! Backend for Amplify, a tipping service for content creators.
//!
//! This binary provides:
//! - **Creator registry** binding wallets to legacy channel ids and to
//!   YouTube channels linked over Google OAuth
//! - **Tip ledger** recording tips and serving per-channel and per-wallet
//!   history and channel statistics
//! - **REST API** (axum), served at the root and under `/api`

mod api;
mod config;
mod error;
mod identity;
mod ledger;
mod oauth;
mod session;

use std::sync::Arc;
use std::time::Duration;

use amplify_store::Database;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::oauth::{ChannelLinker, GoogleYoutubeLinker};

/// Store handle shared by every request handler.
pub type SharedDatabase = Arc<tokio::sync::Mutex<Database>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,amplify_server=debug,amplify_store=debug")),
        )
        .init();

    info!("Starting Amplify server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");
    info!(
        oauth_enabled = config.oauth_configured(),
        frontend = %config.frontend_url,
        "YouTube linking settings"
    );

    // -----------------------------------------------------------------------
    // 3. Open the store and the OAuth collaborator
    // -----------------------------------------------------------------------
    let db = Database::open_at(&config.database_path)?;
    info!(path = ?db.path(), "Database ready");

    let linker: Option<Arc<dyn ChannelLinker>> = match GoogleYoutubeLinker::from_config(&config) {
        Some(linker) => Some(Arc::new(linker)),
        None => {
            warn!("GOOGLE_CLIENT_ID / GOOGLE_CLIENT_SECRET not set, YouTube linking disabled");
            None
        }
    };

    let http_addr = config.http_addr;
    let app_state = AppState::new(db, linker, config);

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic OAuth session cleanup (at most once a minute)
    let sessions = app_state.sessions.clone();
    tokio::spawn(async move {
        let period = sessions.ttl().max(Duration::from_secs(60));
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            sessions.purge_expired().await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
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
