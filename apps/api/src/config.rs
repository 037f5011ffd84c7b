use anyhow::{Context, Result};

use crate::export::auth::{ServiceAccountKey, SheetsCredentials};
use crate::export::sheets::SheetsConfig;
use crate::extraction::skills::DEFAULT_TOP_SKILLS;

const DEFAULT_MAX_BATCH_SIZE: usize = 100;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
const DEFAULT_RETAINED_BATCHES: usize = 32;
const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Application configuration loaded from environment variables.
/// Every variable has a default; the Sheets block is optional as a whole.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Upper bound on documents per batch.
    pub max_batch_size: usize,
    pub top_skills: usize,
    /// Request body limit for uploads, in bytes.
    pub max_upload_bytes: usize,
    /// Batches kept in memory for re-export.
    pub retained_batches: usize,
    /// `None` when Sheets export is not configured.
    pub sheets: Option<SheetsConfig>,
    /// Why a partially configured Sheets block was ignored. Logged once tracing
    /// is up, since config loads before the subscriber exists.
    pub sheets_notice: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so parsing is testable without
    /// touching the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let (sheets, sheets_notice) = sheets_config(&lookup)?;
        Ok(Config {
            port: parse_or(&lookup, "PORT", 8080u16)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            max_batch_size: parse_or(&lookup, "MAX_BATCH_SIZE", DEFAULT_MAX_BATCH_SIZE)?,
            top_skills: parse_or(&lookup, "TOP_SKILLS", DEFAULT_TOP_SKILLS)?,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            retained_batches: parse_or(&lookup, "RETAINED_BATCHES", DEFAULT_RETAINED_BATCHES)?,
            sheets,
            sheets_notice,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

/// The Sheets block is all-or-nothing: a spreadsheet id plus credentials.
/// `GOOGLE_SHEETS_ACCESS_TOKEN` overrides `GOOGLE_SERVICE_ACCOUNT_KEY`, which
/// holds the key JSON itself or a path to the key file. A partial block disables
/// export and returns a notice instead of failing startup.
fn sheets_config(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<(Option<SheetsConfig>, Option<String>)> {
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let sheet_name = non_empty("GOOGLE_SHEETS_TAB").unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string());

    let credentials = match (
        non_empty("GOOGLE_SHEETS_ACCESS_TOKEN"),
        non_empty("GOOGLE_SERVICE_ACCOUNT_KEY"),
    ) {
        (Some(token), _) => Some(SheetsCredentials::AccessToken(token.trim().to_string())),
        (None, Some(raw)) => Some(SheetsCredentials::ServiceAccount(load_service_account_key(&raw)?)),
        (None, None) => None,
    };

    Ok(match (non_empty("GOOGLE_SHEETS_ID"), credentials) {
        (Some(spreadsheet_id), Some(credentials)) => (
            Some(SheetsConfig {
                spreadsheet_id: spreadsheet_id.trim().to_string(),
                credentials,
                sheet_name,
            }),
            None,
        ),
        (None, None) => (None, None),
        (None, Some(_)) => (
            None,
            Some("Google Sheets export disabled: GOOGLE_SHEETS_ID is not set".to_string()),
        ),
        (Some(_), None) => (
            None,
            Some(
                "Google Sheets export disabled: set GOOGLE_SERVICE_ACCOUNT_KEY or GOOGLE_SHEETS_ACCESS_TOKEN"
                    .to_string(),
            ),
        ),
    })
}

fn load_service_account_key(raw: &str) -> Result<ServiceAccountKey> {
    let raw = raw.trim();
    let json = if raw.starts_with('{') {
        raw.to_string()
    } else {
        std::fs::read_to_string(raw)
            .with_context(|| format!("Cannot read GOOGLE_SERVICE_ACCOUNT_KEY file '{raw}'"))?
    };
    ServiceAccountKey::from_json(&json).context("GOOGLE_SERVICE_ACCOUNT_KEY is not a valid service account key")
}
