#![allow(dead_code)]

//! Batch Orchestrator: runs normalization, field extraction, skill ranking and
//! summary composition per document, in input order.
//!
//! Every step runs in isolation: a step that panics is recorded as a failure and
//! its field falls back to the sentinel, while the document's other fields and
//! every other document still complete. One report per input, always.

use std::panic::{self, AssertUnwindSafe};

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::extraction::experience::extract_years_experience;
use crate::extraction::fields::{extract_email, extract_name, extract_phone};
use crate::extraction::job::JobContext;
use crate::extraction::normalizer::{normalize, NormalizedText};
use crate::extraction::skills::{rank_skills, skill_names, DEFAULT_TOP_SKILLS};
use crate::extraction::summary::compose_summary;
use crate::models::candidate::{CandidateFields, CandidateRecord, DocumentInput, Extracted};

/// A pipeline sub-step, used to report misses and isolated failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStep {
    Normalize,
    Name,
    Email,
    Phone,
    YearsExperience,
    Skills,
    Summary,
}

/// Structured partial result for one document: the record plus which steps
/// missed (sentinel outcome) or failed (isolated fault).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub record: CandidateRecord,
    pub misses: Vec<ExtractionStep>,
    pub failures: Vec<ExtractionStep>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizerOptions {
    /// Maximum number of skills kept on each record.
    pub top_skills: usize,
    /// Year used for open-ended ("Present") employment ranges.
    pub reference_year: i32,
}

impl Default for SummarizerOptions {
    fn default() -> Self {
        Self {
            top_skills: DEFAULT_TOP_SKILLS,
            reference_year: Utc::now().year(),
        }
    }
}

/// The field rules the pipeline runs. Swappable so a rule can be replaced or
/// instrumented without touching orchestration.
#[derive(Clone, Copy)]
pub struct FieldExtractors {
    pub name: fn(&NormalizedText, &str) -> Extracted,
    pub email: fn(&NormalizedText) -> Extracted,
    pub phone: fn(&NormalizedText) -> Extracted,
    pub years_experience: fn(&NormalizedText, i32) -> Extracted,
}

impl Default for FieldExtractors {
    fn default() -> Self {
        Self {
            name: extract_name,
            email: extract_email,
            phone: extract_phone,
            years_experience: extract_years_experience,
        }
    }
}

pub struct Summarizer {
    options: SummarizerOptions,
    extractors: FieldExtractors,
}

impl Summarizer {
    pub fn new(options: SummarizerOptions) -> Self {
        Self::with_extractors(options, FieldExtractors::default())
    }

    pub fn with_extractors(options: SummarizerOptions, extractors: FieldExtractors) -> Self {
        Self {
            options,
            extractors,
        }
    }

    pub fn options(&self) -> &SummarizerOptions {
        &self.options
    }

    /// Summarizes one batch: exactly one record per input, in input order, with
    /// `source_id` carried through. Never fails.
    pub fn summarize_batch(
        &self,
        documents: &[DocumentInput],
        job_description: Option<&str>,
    ) -> Vec<CandidateRecord> {
        self.summarize_batch_with_reports(documents, job_description)
            .into_iter()
            .map(|report| report.record)
            .collect()
    }

    /// Same as [`Summarizer::summarize_batch`], keeping per-document diagnostics.
    pub fn summarize_batch_with_reports(
        &self,
        documents: &[DocumentInput],
        job_description: Option<&str>,
    ) -> Vec<DocumentReport> {
        let job = job_description.and_then(JobContext::from_text);
        let reports: Vec<DocumentReport> = self.reports(documents, job.as_ref()).collect();

        let failed = reports.iter().filter(|r| !r.failures.is_empty()).count();
        info!(
            documents = reports.len(),
            with_job_description = job.is_some(),
            failed,
            "Batch summarized"
        );
        reports
    }

    /// Lazily yields one report per document. Callers that need to stop early
    /// can drop the iterator between documents.
    pub fn reports<'a>(
        &'a self,
        documents: &'a [DocumentInput],
        job: Option<&'a JobContext>,
    ) -> impl Iterator<Item = DocumentReport> + 'a {
        documents
            .iter()
            .map(move |document| self.summarize_document(document, job))
    }

    /// Runs the full pipeline for one document.
    pub fn summarize_document(
        &self,
        document: &DocumentInput,
        job: Option<&JobContext>,
    ) -> DocumentReport {
        let source_id = document.source_id.as_str();
        let mut failures = Vec::new();
        let mut misses = Vec::new();

        let text = run_step(ExtractionStep::Normalize, source_id, &mut failures, || {
            normalize(&document.raw_text)
        })
        .unwrap_or_default();

        let extractors = self.extractors;
        let reference_year = self.options.reference_year;

        let mut field = |step: ExtractionStep, f: &dyn Fn() -> Extracted| -> Extracted {
            let value = run_step(step, source_id, &mut failures, f).unwrap_or_default();
            if !value.is_known() {
                misses.push(step);
            }
            value
        };

        let fields = CandidateFields {
            candidate_name: field(ExtractionStep::Name, &|| (extractors.name)(&text, source_id)),
            email: field(ExtractionStep::Email, &|| (extractors.email)(&text)),
            phone: field(ExtractionStep::Phone, &|| (extractors.phone)(&text)),
            years_experience: field(ExtractionStep::YearsExperience, &|| {
                (extractors.years_experience)(&text, reference_year)
            }),
        };

        let ranked = run_step(ExtractionStep::Skills, source_id, &mut failures, || {
            rank_skills(&text, job, usize::MAX)
        })
        .unwrap_or_default();
        if ranked.is_empty() {
            misses.push(ExtractionStep::Skills);
        }

        let summary = run_step(ExtractionStep::Summary, source_id, &mut failures, || {
            compose_summary(&fields, &ranked, &text, job)
        })
        .unwrap_or_default();
        if summary.is_empty() {
            misses.push(ExtractionStep::Summary);
        }

        let mut top = ranked;
        top.truncate(self.options.top_skills);

        if !misses.is_empty() {
            debug!(source_id, ?misses, "Fields resolved to sentinel");
        }

        DocumentReport {
            record: CandidateRecord {
                source_id: document.source_id.clone(),
                candidate_name: fields.candidate_name,
                email: fields.email,
                phone: fields.phone,
                years_experience: fields.years_experience,
                top_skills: skill_names(&top),
                summary,
            },
            misses,
            failures,
        }
    }
}

/// Runs one step, converting a panic into a recorded failure.
fn run_step<T>(
    step: ExtractionStep,
    source_id: &str,
    failures: &mut Vec<ExtractionStep>,
    f: impl FnOnce() -> T,
) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(cause) => {
            let message = cause
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| cause.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!(source_id, ?step, "Extraction step failed: {message}");
            failures.push(step);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::UNKNOWN;

    fn summarizer() -> Summarizer {
        Summarizer::new(SummarizerOptions {
            top_skills: DEFAULT_TOP_SKILLS,
            reference_year: 2025,
        })
    }

    fn two_file_batch() -> Vec<DocumentInput> {
        vec![
            DocumentInput::new(
                "resume1.txt",
                "Jane Doe, jane@x.com, 5 years experience, skills: Python, SQL",
            ),
            DocumentInput::new("resume2.pdf", ""),
        ]
    }

    #[test]
    fn test_one_record_per_input_in_order() {
        let docs: Vec<DocumentInput> = (0..25)
            .map(|i| DocumentInput::new(format!("cv_{i:02}.txt"), format!("Candidate {i} knows Rust")))
            .collect();
        let records = summarizer().summarize_batch(&docs, None);
        assert_eq!(records.len(), docs.len());
        for (doc, record) in docs.iter().zip(&records) {
            assert_eq!(doc.source_id, record.source_id);
        }
    }

    #[test]
    fn test_two_file_scenario() {
        let records = summarizer().summarize_batch(&two_file_batch(), None);
        assert_eq!(records.len(), 2);

        let jane = &records[0];
        assert_eq!(jane.source_id, "resume1.txt");
        assert_eq!(jane.candidate_name.as_str(), "Jane Doe");
        assert_eq!(jane.email.as_str(), "jane@x.com");
        assert_eq!(jane.years_experience.as_str(), "5");
        assert_eq!(jane.top_skills, vec!["Python", "SQL"]);
        assert!(!jane.summary.is_empty());

        let failed = &records[1];
        assert_eq!(failed.source_id, "resume2.pdf");
        assert_eq!(failed.candidate_name.as_str(), UNKNOWN);
        assert_eq!(failed.email.as_str(), UNKNOWN);
        assert_eq!(failed.phone.as_str(), UNKNOWN);
        assert_eq!(failed.years_experience.as_str(), UNKNOWN);
        assert!(failed.top_skills.is_empty());
        assert!(failed.summary.is_empty());
    }

    #[test]
    fn test_empty_document_reports_misses_not_failures() {
        let reports = summarizer().summarize_batch_with_reports(&two_file_batch(), None);
        let empty = &reports[1];
        assert!(empty.failures.is_empty());
        assert!(empty.misses.contains(&ExtractionStep::Email));
        assert!(empty.misses.contains(&ExtractionStep::Skills));
        assert!(empty.misses.contains(&ExtractionStep::Summary));
    }

    #[test]
    fn test_empty_document_with_descriptive_name_is_all_unknown() {
        let docs = vec![DocumentInput::new("jane_doe.pdf", "")];
        let records = summarizer().summarize_batch(&docs, Some("Python developer"));
        let record = &records[0];
        assert_eq!(record.source_id, "jane_doe.pdf");
        assert_eq!(record.candidate_name, Extracted::Unknown);
        assert_eq!(record.email, Extracted::Unknown);
        assert_eq!(record.phone, Extracted::Unknown);
        assert_eq!(record.years_experience, Extracted::Unknown);
        assert!(record.top_skills.is_empty());
        assert!(record.summary.is_empty());
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let docs = two_file_batch();
        let jd = Some("Python and SQL developer");
        let first = summarizer().summarize_batch(&docs, jd);
        let second = summarizer().summarize_batch(&docs, jd);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_failing_step_keeps_other_fields() {
        fn exploding_phone(_: &NormalizedText) -> Extracted {
            panic!("phone rule blew up");
        }
        let summarizer = Summarizer::with_extractors(
            SummarizerOptions {
                top_skills: 8,
                reference_year: 2025,
            },
            FieldExtractors {
                phone: exploding_phone,
                ..FieldExtractors::default()
            },
        );

        let reports = summarizer.summarize_batch_with_reports(&two_file_batch(), None);
        assert_eq!(reports.len(), 2);

        let jane = &reports[0];
        assert_eq!(jane.failures, vec![ExtractionStep::Phone]);
        assert_eq!(jane.record.phone, Extracted::Unknown);
        assert_eq!(jane.record.email.as_str(), "jane@x.com");
        assert_eq!(jane.record.candidate_name.as_str(), "Jane Doe");
        assert!(!jane.record.summary.is_empty());

        assert_eq!(reports[1].record.source_id, "resume2.pdf");
        assert_eq!(reports[1].failures, vec![ExtractionStep::Phone]);
    }

    #[test]
    fn test_top_skills_truncated_to_option() {
        let summarizer = Summarizer::new(SummarizerOptions {
            top_skills: 2,
            reference_year: 2025,
        });
        let docs = vec![DocumentInput::new("a.txt", "Rust Rust Rust Go Go Python")];
        let records = summarizer.summarize_batch(&docs, None);
        assert_eq!(records[0].top_skills, vec!["Rust", "Go"]);
    }

    #[test]
    fn test_job_description_reorders_top_skills() {
        let docs = vec![DocumentInput::new(
            "gopher.txt",
            "Python scripts, Python services, Python data work, and Go.",
        )];
        let without = summarizer().summarize_batch(&docs, None);
        assert_eq!(without[0].top_skills, vec!["Python", "Go"]);

        let with = summarizer().summarize_batch(&docs, Some("Hiring: Go engineer"));
        assert_eq!(with[0].top_skills, vec!["Go", "Python"]);
        assert!(with[0].summary.contains("Relevant to the role: Go."));
    }

    #[test]
    fn test_blank_job_description_is_treated_as_absent() {
        let docs = two_file_batch();
        assert_eq!(
            summarizer().summarize_batch(&docs, Some("   ")),
            summarizer().summarize_batch(&docs, None)
        );
    }

    #[test]
    fn test_reports_iterator_can_stop_between_documents() {
        let docs = two_file_batch();
        let s = summarizer();
        let first: Vec<DocumentReport> = s.reports(&docs, None).take(1).collect();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].record.source_id, "resume1.txt");
    }
}
