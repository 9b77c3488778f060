//! Railbook Reservation Server
//!
//! Main server process for the train reservation system.
//!
//! This binary:
//! - Connects to `PostgreSQL` and runs schema migrations
//! - Builds the reservation store and HTTP router
//! - Serves the booking API until Ctrl+C
//!
//! # Usage
//!
//! ```bash
//! # Start infrastructure
//! docker compose up -d
//!
//! # Run server
//! cargo run --bin railbook-server
//! ```

mod config;

use config::Config;
use railbook_postgres::PostgresReservationStore;
use railbook_web::AppState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,railbook=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Railbook Reservation Server...");

    // Load configuration
    let config = Config::from_env();
    tracing::info!(postgres = %config.postgres.url, "Configuration loaded");

    // Connect and migrate
    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .min_connections(config.postgres.min_connections)
        .acquire_timeout(Duration::from_secs(config.postgres.connect_timeout))
        .idle_timeout(Duration::from_secs(config.postgres.idle_timeout))
        .connect(&config.postgres.url)
        .await?;
    let store = PostgresReservationStore::new(pool);
    store.migrate().await?;
    tracing::info!("Database ready");

    // Build the router and serve
    let state = AppState::new(Arc::new(store));
    let app = railbook_web::router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "Listening");
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to install Ctrl+C handler");
    }
}
