pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::export::handlers as export;
use crate::extraction::handlers as summaries;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Summaries
        .route("/api/v1/summaries", post(summaries::handle_summarize))
        .route("/api/v1/summaries/upload", post(summaries::handle_upload))
        .route("/api/v1/summaries/:id", get(summaries::handle_get_batch))
        // Export
        .route("/api/v1/summaries/:id/csv", get(export::handle_download_csv))
        .route(
            "/api/v1/summaries/:id/export/sheets",
            post(export::handle_export_batch),
        )
        .route("/api/v1/export/sheets", post(export::handle_export_rows))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::export::sheets::{memory::MemorySheet, SheetsExporter};
    use crate::extraction::pipeline::{Summarizer, SummarizerOptions};
    use crate::store::BatchStore;

    const BOUNDARY: &str = "cv-summarizer-boundary";

    fn test_app(sheets: Option<SheetsExporter>) -> Router {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.max_batch_size = 3;
        let summarizer = Summarizer::new(SummarizerOptions {
            top_skills: config.top_skills,
            reference_year: 2025,
        });
        build_router(AppState {
            store: BatchStore::new(config.retained_batches),
            summarizer: Arc::new(summarizer),
            config,
            sheets,
        })
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    fn two_file_batch() -> Value {
        json!({
            "documents": [
                {
                    "source_id": "resume1.txt",
                    "raw_text": "Jane Doe, jane@x.com, 5 years experience, skills: Python, SQL"
                },
                { "source_id": "resume2.pdf", "raw_text": "" }
            ]
        })
    }

    async fn create_batch(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/summaries", two_file_batch()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["batch_id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app(None)
            .oneshot(empty_request("GET", "/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_summarize_two_file_batch() {
        let response = test_app(None)
            .oneshot(json_request("POST", "/api/v1/summaries", two_file_batch()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        let records = body["records"].as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["source_id"], "resume1.txt");
        assert_eq!(records[0]["candidate_name"], "Jane Doe");
        assert_eq!(records[0]["email"], "jane@x.com");
        assert_eq!(records[0]["years_experience"], "5");
        assert_eq!(records[1]["source_id"], "resume2.pdf");
        assert_eq!(records[1]["email"], "unknown");
        assert_eq!(records[1]["summary"], "");
        assert_eq!(body["diagnostics"][1]["source_id"], "resume2.pdf");
        assert!(body["diagnostics"][1]["misses"]
            .as_array()
            .unwrap()
            .contains(&json!("email")));
    }

    #[tokio::test]
    async fn test_summarize_rejects_empty_and_oversized_batches() {
        let app = test_app(None);

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/summaries", json!({"documents": []})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");

        let docs: Vec<Value> = (0..4)
            .map(|i| json!({"source_id": format!("{i}.txt"), "raw_text": "Rust"}))
            .collect();
        let response = app
            .oneshot(json_request("POST", "/api/v1/summaries", json!({"documents": docs})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_batch_and_not_found() {
        let app = test_app(None);
        let id = create_batch(&app).await;

        let response = app
            .clone()
            .oneshot(empty_request("GET", &format!("/api/v1/summaries/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], id.as_str());
        assert_eq!(body["records"].as_array().unwrap().len(), 2);

        let response = app
            .oneshot(empty_request(
                "GET",
                "/api/v1/summaries/00000000-0000-0000-0000-000000000000",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_csv_download() {
        let app = test_app(None);
        let id = create_batch(&app).await;

        let response = app
            .oneshot(empty_request("GET", &format!("/api/v1/summaries/{id}/csv")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"cv_summaries.csv\""
        );

        let text = String::from_utf8(body_bytes(response).await).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("File Name,Candidate Name"));
        assert!(lines[1].starts_with("resume1.txt,Jane Doe,jane@x.com"));
        assert!(lines[2].starts_with("resume2.pdf,unknown"));
    }

    #[tokio::test]
    async fn test_sheets_export_without_credentials() {
        let app = test_app(None);
        let id = create_batch(&app).await;

        let response = app
            .oneshot(empty_request(
                "POST",
                &format!("/api/v1/summaries/{id}/export/sheets"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "SHEETS_NOT_CONFIGURED");
        assert!(body["error"]["message"].as_str().unwrap().contains("CSV"));
    }

    #[tokio::test]
    async fn test_export_rows_requires_rows() {
        let response = test_app(None)
            .oneshot(json_request("POST", "/api/v1/export/sheets", json!({"rows": []})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["message"], "No rows provided");
    }

    #[tokio::test]
    async fn test_batch_export_writes_header_once() {
        let sheet = Arc::new(MemorySheet::default());
        let app = test_app(Some(SheetsExporter::new(sheet.clone(), "Sheet1")));
        let id = create_batch(&app).await;
        let uri = format!("/api/v1/summaries/{id}/export/sheets");

        let response = app.clone().oneshot(empty_request("POST", &uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"header_written": true, "rows_appended": 2})
        );

        let response = app.oneshot(empty_request("POST", &uri)).await.unwrap();
        assert_eq!(
            body_json(response).await,
            json!({"header_written": false, "rows_appended": 2})
        );

        let rows = sheet.snapshot();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0][0], "File Name");
        assert_eq!(rows[1][0], "resume1.txt");
        assert_eq!(rows[3][0], "resume1.txt");
    }

    #[tokio::test]
    async fn test_export_rows_reports_remote_failure() {
        let app = test_app(Some(SheetsExporter::new(
            Arc::new(MemorySheet::failing()),
            "Sheet1",
        )));
        let row: Vec<String> = (0..7).map(|i| format!("c{i}")).collect();

        let response = app
            .oneshot(json_request("POST", "/api/v1/export/sheets", json!({"rows": [row]})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["error"]["code"], "EXPORT_FAILED");
    }

    #[tokio::test]
    async fn test_multipart_upload_keeps_failed_decodes_in_place() {
        let part = |name: &str, file_name: Option<&str>, content: &str| match file_name {
            Some(f) => format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n"
            ),
            None => format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{content}\r\n"
            ),
        };
        let body = [
            part(
                "files",
                Some("resume1.txt"),
                "Jane Doe, jane@x.com, 5 years experience, skills: Python, SQL",
            ),
            part("files", Some("resume2.pdf"), "%PDF-1.4 truncated"),
            part("job_description", None, "Looking for a SQL analyst"),
            format!("--{BOUNDARY}--\r\n"),
        ]
        .concat();

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/summaries/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = test_app(None).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        let records = body["records"].as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["source_id"], "resume1.txt");
        assert_eq!(records[0]["top_skills"], json!(["SQL", "Python"]));
        assert_eq!(records[1]["source_id"], "resume2.pdf");
        assert_eq!(records[1]["candidate_name"], "unknown");
        assert_eq!(records[1]["summary"], "");
    }
}
