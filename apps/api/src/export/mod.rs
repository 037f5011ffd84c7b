//! Tabular exporters. CSV and the remote spreadsheet share one row shape: the
//! seven `COLUMN_HEADERS` columns, top skills joined into one cell.

pub mod auth;
pub mod csv;
pub mod handlers;
pub mod sheets;

use thiserror::Error;

use crate::models::candidate::{CandidateRecord, COLUMN_HEADERS};

pub type Row = Vec<String>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(
        "Missing Google Sheets credentials. Set GOOGLE_SHEETS_ID and GOOGLE_SERVICE_ACCOUNT_KEY, or download the CSV instead."
    )]
    MissingCredentials,

    #[error("No rows provided")]
    Empty,

    #[error("Row {index} has {len} cells, expected {expected}")]
    RowShape {
        index: usize,
        len: usize,
        expected: usize,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Google credentials error: {0}")]
    Credentials(String),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Invalid spreadsheet URL: {0}")]
    Url(String),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn header_row() -> Row {
    COLUMN_HEADERS.iter().map(|h| h.to_string()).collect()
}

/// Records flattened to export rows, in batch order.
pub fn record_rows(records: &[CandidateRecord]) -> Vec<Row> {
    records.iter().map(|r| r.to_row().to_vec()).collect()
}

/// Rejects an empty row set or any row that does not match the column count.
pub fn validate_rows(rows: &[Row]) -> Result<(), ExportError> {
    if rows.is_empty() {
        return Err(ExportError::Empty);
    }
    match rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != COLUMN_HEADERS.len())
    {
        Some((index, row)) => Err(ExportError::RowShape {
            index,
            len: row.len(),
            expected: COLUMN_HEADERS.len(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_rows_keep_batch_order() {
        let records = vec![
            CandidateRecord::empty("b.txt"),
            CandidateRecord::empty("a.txt"),
        ];
        let rows = record_rows(&records);
        assert_eq!(rows[0][0], "b.txt");
        assert_eq!(rows[1][0], "a.txt");
        assert_eq!(rows[0].len(), header_row().len());
    }

    #[test]
    fn test_validate_rows() {
        assert!(matches!(validate_rows(&[]), Err(ExportError::Empty)));
        let good = header_row();
        assert!(validate_rows(&[good.clone()]).is_ok());
        let short = vec!["only".to_string()];
        assert!(matches!(
            validate_rows(&[good, short]),
            Err(ExportError::RowShape { index: 1, len: 1, expected: 7 })
        ));
    }

    #[test]
    fn test_missing_credentials_message_points_to_csv() {
        let message = ExportError::MissingCredentials.to_string();
        assert!(message.contains("GOOGLE_SHEETS_ID"));
        assert!(message.contains("CSV"));
    }
}
