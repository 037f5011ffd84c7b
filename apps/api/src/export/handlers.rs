use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::csv::{to_csv_bytes, CSV_FILE_NAME};
use crate::export::sheets::{AppendOutcome, SheetsExporter};
use crate::export::{record_rows, ExportError, Row};
use crate::extraction::handlers::fetch_batch;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExportRowsRequest {
    #[serde(default)]
    pub rows: Vec<Row>,
}

/// GET /api/v1/summaries/:id/csv
pub async fn handle_download_csv(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let batch = fetch_batch(&state, id).await?;
    let bytes = to_csv_bytes(&batch.records).map_err(|e| AppError::Internal(e.into()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{CSV_FILE_NAME}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// POST /api/v1/summaries/:id/export/sheets
pub async fn handle_export_batch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppendOutcome>, AppError> {
    let exporter = sheets_exporter(&state)?;
    let batch = fetch_batch(&state, id).await?;
    let outcome = exporter.export(&record_rows(&batch.records)).await?;
    Ok(Json(outcome))
}

/// POST /api/v1/export/sheets
pub async fn handle_export_rows(
    State(state): State<AppState>,
    Json(req): Json<ExportRowsRequest>,
) -> Result<Json<AppendOutcome>, AppError> {
    if req.rows.is_empty() {
        return Err(ExportError::Empty.into());
    }
    let exporter = sheets_exporter(&state)?;
    let outcome = exporter.export(&req.rows).await?;
    Ok(Json(outcome))
}

fn sheets_exporter(state: &AppState) -> Result<&SheetsExporter, AppError> {
    state
        .sheets
        .as_ref()
        .ok_or(AppError::Export(ExportError::MissingCredentials))
}
