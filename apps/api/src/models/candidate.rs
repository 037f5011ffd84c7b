#![allow(dead_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel written in place of any field the extractor could not resolve.
pub const UNKNOWN: &str = "unknown";

/// Column order shared by every tabular exporter (CSV, Sheets, results table).
pub const COLUMN_HEADERS: [&str; 7] = [
    "File Name",
    "Candidate Name",
    "Email",
    "Phone",
    "Years Experience",
    "Top Skills",
    "Summary",
];

/// Delimiter used when flattening `top_skills` into a single cell.
pub const SKILL_DELIMITER: &str = ", ";

/// One decoded document of a batch. `source_id` is the original file name and is
/// echoed verbatim into the resulting record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInput {
    pub source_id: String,
    #[serde(default)]
    pub raw_text: String,
}

impl DocumentInput {
    pub fn new(source_id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            raw_text: raw_text.into(),
        }
    }
}

/// Outcome of a single extraction rule: either a value or the `unknown` sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Extracted {
    Found(String),
    #[default]
    Unknown,
}

impl Extracted {
    pub fn is_known(&self) -> bool {
        matches!(self, Extracted::Found(_))
    }

    pub fn as_option(&self) -> Option<&str> {
        match self {
            Extracted::Found(v) => Some(v.as_str()),
            Extracted::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &str {
        self.as_option().unwrap_or(UNKNOWN)
    }
}

impl From<Option<String>> for Extracted {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => Extracted::Found(v),
            _ => Extracted::Unknown,
        }
    }
}

impl From<String> for Extracted {
    fn from(value: String) -> Self {
        if value.trim().is_empty() || value == UNKNOWN {
            Extracted::Unknown
        } else {
            Extracted::Found(value)
        }
    }
}

impl From<Extracted> for String {
    fn from(value: Extracted) -> Self {
        match value {
            Extracted::Found(v) => v,
            Extracted::Unknown => UNKNOWN.to_string(),
        }
    }
}

impl fmt::Display for Extracted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single-valued fields resolved by the field extractor, before skills and
/// summary are attached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFields {
    pub candidate_name: Extracted,
    pub email: Extracted,
    pub phone: Extracted,
    pub years_experience: Extracted,
}

/// Structured result for one input document. Built once by the pipeline and
/// handed to exporters read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub source_id: String,
    pub candidate_name: Extracted,
    pub email: Extracted,
    pub phone: Extracted,
    pub years_experience: Extracted,
    pub top_skills: Vec<String>,
    pub summary: String,
}

impl CandidateRecord {
    /// Record with every field at its sentinel/empty value.
    pub fn empty(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            candidate_name: Extracted::Unknown,
            email: Extracted::Unknown,
            phone: Extracted::Unknown,
            years_experience: Extracted::Unknown,
            top_skills: Vec::new(),
            summary: String::new(),
        }
    }

    /// Flattens the record into the seven-column export row.
    pub fn to_row(&self) -> [String; 7] {
        [
            self.source_id.clone(),
            self.candidate_name.to_string(),
            self.email.to_string(),
            self.phone.to_string(),
            self.years_experience.to_string(),
            self.top_skills.join(SKILL_DELIMITER),
            self.summary.clone(),
        ]
    }
}
