//! # Project Organiser API Server
//!
//! REST backend for the project organiser: accounts, session tokens,
//! projects, tasks and image uploads.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment (`.env` honoured)
//! 2. Initialise tracing
//! 3. Connect the store; with PostgreSQL, apply embedded migrations
//! 4. Serve until Ctrl-C, then drain and close the pool
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) STORE_BACKEND=memory cargo run -p organiser-api
//! ```

use anyhow::Context;
use organiser_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat, StoreConfig},
};
use organiser_shared::{
    blob::{BlobStore, LocalBlobStore},
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    store::{memory::MemoryStore, postgres::PgStore},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(format: LogFormat) {
    let json = format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "organiser_api=debug,organiser_shared=debug,tower_http=debug".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    init_tracing(config.log_format);

    tracing::info!(
        "Project Organiser API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(
        &config.uploads.dir,
        &config.uploads.public_base_url,
        config.uploads.max_bytes,
    ));

    let (state, pool) = match &config.store {
        StoreConfig::Postgres {
            url,
            max_connections,
        } => {
            let pool = create_pool(DatabaseConfig {
                url: url.clone(),
                max_connections: *max_connections,
                ..Default::default()
            })
            .await
            .context("Failed to connect to database")?;

            run_migrations(&pool)
                .await
                .context("Failed to apply database migrations")?;

            let state = AppState::new(PgStore::new(pool.clone()), blobs, config.clone())?;
            (state, Some(pool))
        }
        StoreConfig::Memory => {
            tracing::warn!("Using in-memory store; all data is lost on shutdown");
            (AppState::new(MemoryStore::new(), blobs, config.clone())?, None)
        }
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;

    tracing::info!("Server listening on http://{}", config.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}
