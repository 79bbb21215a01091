mod config;
mod errors;
mod news;
mod routes;
mod sheet_client;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::news::{RecordCache, RecordStore};
use crate::routes::build_router;
use crate::sheet_client::SheetClient;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Snack API v{}", env!("CARGO_PKG_VERSION"));

    let source = SheetClient::new(config.sheet_csv_url.clone(), config.fetch_timeout);
    info!(
        "Sheet client initialized (timeout {:?}, reference zone {})",
        config.fetch_timeout, config.reference_tz
    );

    let store = RecordStore::new(
        Arc::new(source),
        config.columns.clone(),
        config.reference_tz,
    );
    let records = Arc::new(RecordCache::new(store, config.refresh_ttl));

    // Warm the cache; an unavailable source is logged and retried after the TTL
    let snapshot = records.refresh_if_stale().await;
    info!(
        "Initial load: {} records, source {:?}",
        snapshot.records.len(),
        snapshot.status
    );

    let state = AppState {
        config: config.clone(),
        records,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
