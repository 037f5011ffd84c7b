//! DOCX raw-text extraction: reads `word/document.xml` from the archive and
//! flattens the WordprocessingML body to text, one line per paragraph.

use std::io::{Cursor, Read};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::decode::DecodeError;

const DOCUMENT_PART: &str = "word/document.xml";

static PARAGRAPH_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</w:p>|<w:(?:br|cr)\b[^>]*/>").expect("valid regex"));
static TAB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<w:tab\b[^>]*/>").expect("valid regex"));
/// Tracked deletions and field codes carry text that is not part of the visible
/// document.
static HIDDEN_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:delText\b[^>]*>.*?</w:delText>|<w:instrText\b[^>]*>.*?</w:instrText>")
        .expect("valid regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|amp|lt|gt|quot|apos);").expect("valid regex")
});

pub fn extract_text(bytes: &[u8]) -> Result<String, DecodeError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name(DOCUMENT_PART)?.read_to_string(&mut xml)?;
    Ok(xml_to_text(&xml))
}

/// Deleted runs and field codes are dropped, paragraph ends and breaks become
/// newlines, tabs become tabs, every other tag is dropped, then XML entities are
/// resolved.
pub fn xml_to_text(xml: &str) -> String {
    let text = HIDDEN_TEXT_RE.replace_all(xml, "");
    let text = PARAGRAPH_END_RE.replace_all(&text, "\n");
    let text = TAB_RE.replace_all(&text, "\t");
    let text = TAG_RE.replace_all(&text, "");
    unescape(&text).trim().to_string()
}

fn unescape(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            match entity {
                "amp" => "&".to_string(),
                "lt" => "<".to_string(),
                "gt" => ">".to_string(),
                "quot" => "\"".to_string(),
                "apos" => "'".to_string(),
                _ => {
                    let code = match entity.strip_prefix("#x") {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => entity[1..].parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                        .map(String::from)
                        .unwrap_or_else(|| caps[0].to_string())
                }
            }
        })
        .into_owned()
}
