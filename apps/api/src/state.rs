use std::sync::Arc;

use crate::config::Config;
use crate::export::sheets::SheetsExporter;
use crate::extraction::pipeline::Summarizer;
use crate::store::BatchStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Extraction pipeline, shared read-only with blocking worker threads.
    pub summarizer: Arc<Summarizer>,
    pub store: BatchStore,
    /// Remote spreadsheet exporter. `None` when Sheets is not configured; the
    /// export endpoints then answer with a typed configuration error.
    pub sheets: Option<SheetsExporter>,
}
