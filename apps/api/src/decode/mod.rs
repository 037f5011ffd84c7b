#![allow(dead_code)]

//! Upstream decoders: uploaded bytes to raw document text.
//!
//! A decode failure is not a pipeline error: callers log it and hand the
//! pipeline an empty text for that document, keeping the batch position.

pub mod docx;

use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("DOCX read error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentFormat {
    /// Format by file extension (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" | "text" | "md" => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Format by magic bytes, for uploads without a usable extension.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF") {
            Some(Self::Pdf)
        } else if bytes.starts_with(b"PK\x03\x04") {
            Some(Self::Docx)
        } else if std::str::from_utf8(bytes).is_ok() {
            Some(Self::PlainText)
        } else {
            None
        }
    }
}

/// Decodes one uploaded file to text.
pub fn decode_document(file_name: &str, bytes: &[u8]) -> Result<String, DecodeError> {
    let format = DocumentFormat::from_file_name(file_name)
        .or_else(|| DocumentFormat::sniff(bytes))
        .ok_or_else(|| DecodeError::Unsupported(file_name.to_string()))?;

    let text = match format {
        DocumentFormat::Pdf => decode_pdf(bytes)?,
        DocumentFormat::Docx => docx::extract_text(bytes)?,
        DocumentFormat::PlainText => decode_plain_text(bytes),
    };

    debug!(file_name, ?format, chars = text.len(), "Decoded document");
    Ok(text)
}

/// Same as [`decode_document`], resolving any failure to empty text.
pub fn decode_or_empty(file_name: &str, bytes: &[u8]) -> String {
    match decode_document(file_name, bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(file_name, "Decode failed, continuing with empty text: {e}");
            String::new()
        }
    }
}

/// The PDF parser panics on some malformed inputs, so the call is isolated.
fn decode_pdf(bytes: &[u8]) -> Result<String, DecodeError> {
    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes))) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(DecodeError::Pdf(format!("{e:?}"))),
        Err(_) => Err(DecodeError::Pdf("parser panicked".to_string())),
    }
}

fn decode_plain_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_file_name("cv.PDF"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_file_name("a.b.docx"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_file_name("notes.txt"), Some(DocumentFormat::PlainText));
        assert_eq!(DocumentFormat::from_file_name("resume"), None);
        assert_eq!(DocumentFormat::from_file_name("cv.doc"), None);
    }

    #[test]
    fn test_sniff_magic_bytes() {
        assert_eq!(DocumentFormat::sniff(b"%PDF-1.7 ..."), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::sniff(b"PK\x03\x04rest"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::sniff(b"Jane Doe"), Some(DocumentFormat::PlainText));
        assert_eq!(DocumentFormat::sniff(&[0xff, 0xfe, 0x00, 0x9f]), None);
    }

    #[test]
    fn test_plain_text_strips_bom() {
        let text = decode_document("cv.txt", b"\xEF\xBB\xBFJane Doe").unwrap();
        assert_eq!(text, "Jane Doe");
    }

    #[test]
    fn test_plain_text_is_lossy_not_failing() {
        let text = decode_document("cv.txt", &[b'J', 0xff, b'D']).unwrap();
        assert!(text.starts_with('J'));
        assert!(text.ends_with('D'));
    }

    #[test]
    fn test_corrupt_pdf_is_an_error() {
        let result = decode_document("resume2.pdf", b"%PDF-1.4 this is not a pdf");
        assert!(matches!(result, Err(DecodeError::Pdf(_))));
    }

    #[test]
    fn test_decode_failure_resolves_to_empty_text() {
        assert_eq!(decode_or_empty("resume2.pdf", b"garbage"), "");
        assert_eq!(decode_or_empty("photo.bin", &[0xff, 0xd8, 0xff, 0xe0]), "");
    }

    #[test]
    fn test_unknown_extension_is_sniffed() {
        let text = decode_document("upload", b"Plain words").unwrap();
        assert_eq!(text, "Plain words");
    }
}
