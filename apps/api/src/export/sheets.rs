#![allow(dead_code)]

//! Remote spreadsheet exporter: appends record rows to a Google Sheet.
//!
//! Header contract: the first row of the target sheet is read; if it is empty the
//! header is written once, then every row is appended below the existing data
//! with INSERT_ROWS. Re-running an export never writes a second header and never
//! overwrites existing rows.
//!
//! `SheetsExporter` holds an `Arc<dyn SheetsApi>`, so the REST client can be
//! swapped for an in-memory sheet in tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::export::auth::{SheetsCredentials, TokenProvider};
use crate::export::{header_row, validate_rows, ExportError, Row};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
const HEADER_CELLS: &str = "A1:G1";
const FIRST_DATA_CELL: &str = "A2";
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Destination and credentials for the remote exporter, built from config and
/// passed in explicitly. An absent config is `ExportError::MissingCredentials`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub credentials: SheetsCredentials,
    pub sheet_name: String,
}

/// Result of one append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppendOutcome {
    pub header_written: bool,
    pub rows_appended: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The three spreadsheet value operations the exporter needs.
#[async_trait]
pub trait SheetsApi: Send + Sync {
    /// Values in `range`, row-major. Missing cells are absent, not empty strings.
    async fn read_range(&self, range: &str) -> Result<Vec<Row>, ExportError>;

    /// Overwrites `range` with `rows`, values stored as given.
    async fn update_range(&self, range: &str, rows: &[Row]) -> Result<(), ExportError>;

    /// Appends `rows` after the table found at `range`, inserting new rows.
    async fn append_rows(&self, range: &str, rows: &[Row]) -> Result<(), ExportError>;

    /// Backend name, for logs.
    fn backend_name(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// Exporter
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct SheetsExporter {
    api: Arc<dyn SheetsApi>,
    sheet_name: String,
}

impl SheetsExporter {
    pub fn new(api: Arc<dyn SheetsApi>, sheet_name: impl Into<String>) -> Self {
        Self {
            api,
            sheet_name: sheet_name.into(),
        }
    }

    /// Exporter backed by the Google Sheets REST API.
    pub fn from_config(config: SheetsConfig) -> Result<Self, ExportError> {
        let sheet_name = config.sheet_name.clone();
        let client = GoogleSheetsClient::new(config)?;
        Ok(Self::new(Arc::new(client), sheet_name))
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Validates `rows`, makes sure the header exists, then appends.
    pub async fn export(&self, rows: &[Row]) -> Result<AppendOutcome, ExportError> {
        validate_rows(rows)?;
        append_with_header(self.api.as_ref(), &self.sheet_name, rows).await
    }
}

/// Writes the header if the sheet's first row is empty, then appends `rows`
/// starting after the header.
pub async fn append_with_header(
    api: &dyn SheetsApi,
    sheet_name: &str,
    rows: &[Row],
) -> Result<AppendOutcome, ExportError> {
    let header_range = a1_range(sheet_name, HEADER_CELLS);
    let first_row = api
        .read_range(&header_range)
        .await?
        .into_iter()
        .next()
        .unwrap_or_default();

    let header = header_row();
    let header_written = if first_row.iter().all(|cell| cell.trim().is_empty()) {
        api.update_range(&header_range, std::slice::from_ref(&header))
            .await?;
        true
    } else {
        if first_row != header {
            warn!(
                sheet = sheet_name,
                "First row does not match the expected header, appending below it"
            );
        }
        false
    };

    api.append_rows(&a1_range(sheet_name, FIRST_DATA_CELL), rows)
        .await?;

    info!(
        backend = api.backend_name(),
        sheet = sheet_name,
        rows = rows.len(),
        header_written,
        "Rows appended to spreadsheet"
    );

    Ok(AppendOutcome {
        header_written,
        rows_appended: rows.len(),
    })
}

/// A1 notation for `cells` on `sheet_name`, quoting the sheet name when needed.
pub fn a1_range(sheet_name: &str, cells: &str) -> String {
    if sheet_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        format!("{sheet_name}!{cells}")
    } else {
        format!("'{}'!{cells}", sheet_name.replace('\'', "''"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Google Sheets v4 REST client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct ValuesBody<'a> {
    values: &'a [Row],
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct GoogleSheetsClient {
    client: Client,
    tokens: Arc<TokenProvider>,
    spreadsheet_id: String,
    base_url: String,
    retry_delay: Duration,
}

impl GoogleSheetsClient {
    pub fn new(config: SheetsConfig) -> Result<Self, ExportError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let tokens = TokenProvider::new(config.credentials, client.clone())?;
        Ok(Self {
            client,
            tokens: Arc::new(tokens),
            spreadsheet_id: config.spreadsheet_id,
            base_url: SHEETS_API_BASE.to_string(),
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Points the client at another host (a local stand-in in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// First backoff step; doubles per retry.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}{suffix}`, each part encoded as
    /// a single path segment.
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, ExportError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| ExportError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ExportError::Url(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values"])
            .push(&format!("{range}{suffix}"));
        Ok(url)
    }

    /// Sends the request built by `build`, retrying on 429 (and on 5xx when
    /// `retry_server_errors`) with exponential backoff. A 401 refreshes a minted
    /// token once; nothing was written, so any operation may be resent.
    async fn send_with_retry<F>(
        &self,
        operation: &'static str,
        retry_server_errors: bool,
        build: F,
    ) -> Result<Response, ExportError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut last_error: Option<ExportError> = None;
        let mut reauthorized = false;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = self.retry_delay * (1 << (attempt - 1));
                warn!(
                    "Sheets {operation} attempt {attempt} failed, retrying after {}ms...",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let token = self.tokens.bearer().await?;
            let response = match build().bearer_auth(&token).send().await {
                Ok(r) => r,
                Err(e) => {
                    if retry_server_errors {
                        last_error = Some(ExportError::Http(e));
                        continue;
                    }
                    return Err(ExportError::Http(e));
                }
            };

            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && !reauthorized && self.tokens.invalidate().await {
                reauthorized = true;
                let body = response.text().await.unwrap_or_default();
                warn!("Sheets API rejected the access token on {operation}, minting a new one");
                last_error = Some(ExportError::Api {
                    status: status.as_u16(),
                    message: error_message(body),
                });
                continue;
            }

            let retryable = status.as_u16() == 429 || (retry_server_errors && status.is_server_error());

            if retryable {
                let body = response.text().await.unwrap_or_default();
                warn!("Sheets API returned {status} on {operation}: {body}");
                last_error = Some(ExportError::Api {
                    status: status.as_u16(),
                    message: error_message(body),
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ExportError::Api {
                    status: status.as_u16(),
                    message: error_message(body),
                });
            }

            debug!("Sheets {operation} succeeded with {status}");
            return Ok(response);
        }

        Err(last_error.unwrap_or(ExportError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

fn error_message(body: String) -> String {
    serde_json::from_str::<GoogleError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

#[async_trait]
impl SheetsApi for GoogleSheetsClient {
    async fn read_range(&self, range: &str) -> Result<Vec<Row>, ExportError> {
        let url = self.values_url(range, "")?;
        let response = self
            .send_with_retry("values.get", true, || self.client.get(url.clone()))
            .await?;
        let body: ValueRange = response.json().await?;
        Ok(body.values)
    }

    async fn update_range(&self, range: &str, rows: &[Row]) -> Result<(), ExportError> {
        let url = self.values_url(range, "")?;
        let body = ValuesBody { values: rows };
        self.send_with_retry("values.update", true, || {
            self.client
                .put(url.clone())
                .query(&[("valueInputOption", "RAW")])
                .json(&body)
        })
        .await?;
        Ok(())
    }

    async fn append_rows(&self, range: &str, rows: &[Row]) -> Result<(), ExportError> {
        let url = self.values_url(range, ":append")?;
        let body = ValuesBody { values: rows };
        // A 5xx may still have appended server-side; only 429 is safe to resend.
        self.send_with_retry("values.append", false, || {
            self.client
                .post(url.clone())
                .query(&[
                    ("valueInputOption", "RAW"),
                    ("insertDataOption", "INSERT_ROWS"),
                ])
                .json(&body)
        })
        .await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "google-sheets"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory sheet (tests)
// ────────────────────────────────────────────────────────────────────────────
