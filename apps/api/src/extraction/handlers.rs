use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::decode::decode_or_empty;
use crate::errors::AppError;
use crate::extraction::pipeline::{DocumentReport, ExtractionStep};
use crate::models::candidate::{CandidateRecord, DocumentInput};
use crate::state::AppState;
use crate::store::{BatchId, StoredBatch};

const FILES_FIELD: &str = "files";
const JOB_DESCRIPTION_FIELD: &str = "job_description";

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub documents: Vec<DocumentInput>,
    #[serde(default)]
    pub job_description: Option<String>,
}

/// Per-document diagnostics, in batch order.
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentDiagnostics {
    pub source_id: String,
    pub misses: Vec<ExtractionStep>,
    pub failures: Vec<ExtractionStep>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub batch_id: BatchId,
    pub records: Vec<CandidateRecord>,
    pub diagnostics: Vec<DocumentDiagnostics>,
}

/// POST /api/v1/summaries
pub async fn handle_summarize(
    State(state): State<AppState>,
    Json(req): Json<SummarizeRequest>,
) -> Result<(StatusCode, Json<SummarizeResponse>), AppError> {
    validate_batch_size(req.documents.len(), state.config.max_batch_size)?;
    let response = summarize_and_store(&state, req.documents, req.job_description).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/summaries/upload
///
/// Multipart form: one `files` part per document (PDF, DOCX or plain text) and
/// an optional `job_description` text part. Files that fail to decode keep their
/// position with empty text.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SummarizeResponse>), AppError> {
    let max = state.config.max_batch_size;
    let mut uploads: Vec<(String, Bytes)> = Vec::new();
    let mut job_description: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(JOB_DESCRIPTION_FIELD) => {
                job_description = Some(field.text().await.map_err(multipart_error)?);
            }
            Some(FILES_FIELD) | Some("file") => {
                if uploads.len() == max {
                    return Err(AppError::Validation(format!(
                        "A batch accepts at most {max} documents"
                    )));
                }
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("document-{}", uploads.len() + 1));
                let bytes = field.bytes().await.map_err(multipart_error)?;
                uploads.push((file_name, bytes));
            }
            _ => {}
        }
    }

    validate_batch_size(uploads.len(), max)?;

    let documents = tokio::task::spawn_blocking(move || {
        uploads
            .into_iter()
            .map(|(file_name, bytes)| {
                let text = decode_or_empty(&file_name, &bytes);
                DocumentInput::new(file_name, text)
            })
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in decoding: {e}")))?;

    let response = summarize_and_store(&state, documents, job_description).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/summaries/:id
pub async fn handle_get_batch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoredBatch>, AppError> {
    let batch = fetch_batch(&state, id).await?;
    Ok(Json(batch.as_ref().clone()))
}

/// Retained batch by id, or `NotFound`.
pub async fn fetch_batch(state: &AppState, id: BatchId) -> Result<Arc<StoredBatch>, AppError> {
    state
        .store
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Batch {id} not found or no longer retained")))
}

fn validate_batch_size(count: usize, max: usize) -> Result<(), AppError> {
    if count == 0 {
        return Err(AppError::Validation(
            "At least one document is required".to_string(),
        ));
    }
    if count > max {
        return Err(AppError::Validation(format!(
            "A batch accepts at most {max} documents, got {count}"
        )));
    }
    Ok(())
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(e.body_text())
    }
}

/// Runs the CPU-bound pipeline on a blocking thread, then retains the batch.
async fn summarize_and_store(
    state: &AppState,
    documents: Vec<DocumentInput>,
    job_description: Option<String>,
) -> Result<SummarizeResponse, AppError> {
    let summarizer = state.summarizer.clone();
    let jd = job_description.clone();
    let reports: Vec<DocumentReport> = tokio::task::spawn_blocking(move || {
        summarizer.summarize_batch_with_reports(&documents, jd.as_deref())
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in summarizing: {e}")))?;

    let mut records = Vec::with_capacity(reports.len());
    let mut diagnostics = Vec::with_capacity(reports.len());
    for report in reports {
        diagnostics.push(DocumentDiagnostics {
            source_id: report.record.source_id.clone(),
            misses: report.misses,
            failures: report.failures,
        });
        records.push(report.record);
    }

    let job_description = job_description.filter(|jd| !jd.trim().is_empty());
    let batch = state
        .store
        .insert(StoredBatch::new(job_description, records))
        .await;
    info!(batch_id = %batch.id, documents = batch.records.len(), "Batch stored");

    Ok(SummarizeResponse {
        batch_id: batch.id,
        records: batch.records.clone(),
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size_bounds() {
        assert!(validate_batch_size(0, 100).is_err());
        assert!(validate_batch_size(1, 100).is_ok());
        assert!(validate_batch_size(100, 100).is_ok());
        assert!(matches!(
            validate_batch_size(101, 100),
            Err(AppError::Validation(msg)) if msg.contains("at most 100")
        ));
    }
}
