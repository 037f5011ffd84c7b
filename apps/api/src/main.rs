mod config;
mod decode;
mod errors;
mod export;
mod extraction;
mod models;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::export::sheets::SheetsExporter;
use crate::extraction::pipeline::{Summarizer, SummarizerOptions};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::BatchStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Summarizer v{}", env!("CARGO_PKG_VERSION"));
    if let Some(notice) = &config.sheets_notice {
        warn!("{notice}");
    }

    // Extraction pipeline
    let summarizer = Summarizer::new(SummarizerOptions {
        top_skills: config.top_skills,
        ..SummarizerOptions::default()
    });
    info!(
        "Summarizer ready (top skills: {}, reference year: {})",
        summarizer.options().top_skills,
        summarizer.options().reference_year
    );

    // Google Sheets exporter (optional)
    let sheets = match config.sheets.clone() {
        Some(sheets_config) => {
            let exporter = SheetsExporter::from_config(sheets_config)?;
            info!("Google Sheets export enabled (tab: {})", exporter.sheet_name());
            Some(exporter)
        }
        None => {
            warn!("Google Sheets export not configured; CSV download only");
            None
        }
    };

    // Build app state
    let state = AppState {
        store: BatchStore::new(config.retained_batches),
        summarizer: Arc::new(summarizer),
        config: config.clone(),
        sheets,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the upload UI has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
