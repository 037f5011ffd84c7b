#![allow(dead_code)]

//! Local CSV exporter. Header row first, standard quoting where needed.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::export::ExportError;
use crate::models::candidate::{CandidateRecord, COLUMN_HEADERS};

pub const CSV_FILE_NAME: &str = "cv_summaries.csv";

pub fn write_csv<W: Write>(writer: W, records: &[CandidateRecord]) -> Result<(), ExportError> {
    let mut out = ::csv::Writer::from_writer(writer);
    out.write_record(COLUMN_HEADERS)?;
    for record in records {
        out.write_record(record.to_row())?;
    }
    out.flush()?;
    Ok(())
}

pub fn to_csv_bytes(records: &[CandidateRecord]) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, records)?;
    Ok(buffer)
}

pub fn write_csv_file(path: &Path, records: &[CandidateRecord]) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_csv(file, records)
}
