//! Field Extractor: independent, total extraction rules for contact fields.
//!
//! Each field is resolved by an ordered list of rules. The first rule that
//! produces a value wins; within a rule, the first match in document order wins.
//! No rule ever fails: a miss is `Extracted::Unknown`.

use std::sync::LazyLock;

use regex::Regex;

use crate::extraction::normalizer::NormalizedText;
use crate::models::candidate::Extracted;

/// A named extraction rule. Rules are plain functions so they can be tested and
/// reordered without touching the pipeline.
pub struct FieldRule {
    pub name: &'static str,
    pub apply: fn(&NormalizedText) -> Option<String>,
}

/// Runs rules in order and returns the first hit.
pub fn apply_rules(rules: &[FieldRule], text: &NormalizedText) -> Option<String> {
    rules.iter().find_map(|rule| {
        let hit = (rule.apply)(text);
        if hit.is_some() {
            tracing::trace!(rule = rule.name, "field rule matched");
        }
        hit
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Email
// ────────────────────────────────────────────────────────────────────────────

pub const EMAIL_RULES: &[FieldRule] = &[
    FieldRule {
        name: "email.plain",
        apply: plain_email,
    },
    FieldRule {
        name: "email.obfuscated",
        apply: obfuscated_email,
    },
];

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[a-z0-9._%+\-]+@[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?)*\.[a-z]{2,}")
        .expect("valid email regex")
});

static OBFUSCATED_EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([a-z0-9._%+\-]+)\s*[\[(]\s*at\s*[\])]\s*([a-z0-9\-]+(?:\s*[\[(]\s*dot\s*[\])]\s*[a-z0-9\-]+)+)",
    )
    .expect("valid obfuscated email regex")
});

static OBFUSCATED_DOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*[\[(]\s*dot\s*[\])]\s*").expect("valid dot regex"));

fn plain_email(text: &NormalizedText) -> Option<String> {
    EMAIL_RE
        .find(text.as_str())
        .map(|m| m.as_str().trim_start_matches('.').to_string())
}

fn obfuscated_email(text: &NormalizedText) -> Option<String> {
    let caps = OBFUSCATED_EMAIL_RE.captures(text.as_str())?;
    let local = caps.get(1)?.as_str();
    let domain = OBFUSCATED_DOT_RE.replace_all(caps.get(2)?.as_str(), ".");
    Some(format!("{local}@{domain}"))
}

/// First address-shaped token (`local@domain.tld`), unchanged. No DNS or
/// deliverability checks.
pub fn extract_email(text: &NormalizedText) -> Extracted {
    apply_rules(EMAIL_RULES, text).into()
}

// ────────────────────────────────────────────────────────────────────────────
// Phone
// ────────────────────────────────────────────────────────────────────────────

const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

pub const PHONE_RULES: &[FieldRule] = &[FieldRule {
    name: "phone.first_candidate",
    apply: first_phone_candidate,
}];

// Single-line candidates only: `[ \t]` rather than `\s` keeps a number from
// swallowing the next line.
static PHONE_CANDIDATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+?[(\d][\d \t().\-]{4,}\d").expect("valid phone regex")
});

static YEAR_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:19|20)\d{2}\s*[-.–]?\s*(?:(?:19|20)\d{2})?$").expect("valid year range regex")
});

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{4}[./\-]\d{1,2}[./\-]\d{1,2}|\d{1,2}[./\-]\d{1,2}[./\-]\d{2,4})$")
        .expect("valid date regex")
});

fn first_phone_candidate(text: &NormalizedText) -> Option<String> {
    PHONE_CANDIDATE_RE
        .find_iter(text.as_str())
        .map(|m| m.as_str())
        .find(|candidate| is_plausible_phone(candidate))
        .map(|c| c.trim().to_string())
}

fn is_plausible_phone(candidate: &str) -> bool {
    let digits = candidate.chars().filter(|c| c.is_ascii_digit()).count();
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        return false;
    }
    let opens = candidate.matches('(').count();
    let closes = candidate.matches(')').count();
    if opens != closes || candidate.starts_with(')') {
        return false;
    }
    if candidate.contains("  ") {
        return false;
    }
    let trimmed = candidate.trim();
    if YEAR_RANGE_RE.is_match(trimmed) || DATE_RE.is_match(trimmed) {
        return false;
    }
    let groups: Vec<&str> = trimmed
        .split(|c: char| !c.is_ascii_digit())
        .filter(|g| !g.is_empty())
        .collect();
    !is_employment_dates(&groups)
}

/// "2018 - 2020 2021", "06.2019 - 08.2021" and "2019-06" are employment dates:
/// every digit group is a year or a month, and no month stands without a year.
fn is_employment_dates(groups: &[&str]) -> bool {
    let is_year = |g: &str| g.len() == 4 && (g.starts_with("19") || g.starts_with("20"));
    let is_month = |g: &str| g.len() <= 2 && g.parse::<u8>().is_ok_and(|m| (1..=12).contains(&m));

    let years = groups.iter().filter(|g| is_year(g)).count();
    let months = groups.iter().filter(|g| is_month(g)).count();
    groups.len() > 1 && years + months == groups.len() && years >= 1 && months <= years
}

/// First phone-number-shaped token in document order: optional leading `+`,
/// grouped digits separated by spaces, dots, dashes or parentheses, 7–15 digits.
pub fn extract_phone(text: &NormalizedText) -> Extracted {
    apply_rules(PHONE_RULES, text).into()
}

// ────────────────────────────────────────────────────────────────────────────
// Name
// ────────────────────────────────────────────────────────────────────────────

/// How many leading non-empty lines are considered for the name heuristic.
const NAME_SCAN_LINES: usize = 8;
const MAX_NAME_LEN: usize = 48;

pub const NAME_RULES: &[FieldRule] = &[
    FieldRule {
        name: "name.labeled",
        apply: labeled_name,
    },
    FieldRule {
        name: "name.top_line",
        apply: top_line_name,
    },
];

/// Words that make a title-cased line a heading or a job title rather than a name.
const NOT_NAME_WORDS: &[&str] = &[
    "resume", "résumé", "curriculum", "vitae", "cv", "profile", "summary", "objective",
    "experience", "education", "skills", "contact", "references", "projects", "about",
    "professional", "personal", "details", "information", "work", "history", "employment",
    "certifications", "languages", "interests", "page", "engineer", "developer", "manager",
    "analyst", "designer", "consultant", "scientist", "architect", "specialist", "director",
    "senior", "junior", "lead", "principal", "intern", "software", "data", "full", "stack",
    "frontend", "backend", "product", "project", "marketing", "sales", "officer", "assistant",
    "administrator", "coordinator", "technician", "associate", "executive", "president",
    "head", "team", "university", "college", "school", "institute", "inc", "llc", "ltd",
    "street", "avenue", "road", "phone", "email", "mobile", "address", "linkedin", "github",
];

/// Filename tokens that never contribute to a name guess.
const FILENAME_NOISE: &[&str] = &[
    "resume", "résumé", "cv", "curriculum", "vitae", "final", "updated", "new", "copy", "draft",
    "latest", "english", "en", "doc", "pdf", "v",
];

static LABELED_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:full\s+)?name\s*[:\-]\s*(.+)$").expect("valid labeled name regex")
});

static SEGMENT_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(?:[,|•·–—]|\s-\s)\s*").expect("valid segment regex"));

fn labeled_name(text: &NormalizedText) -> Option<String> {
    LABELED_NAME_RE
        .captures_iter(text.as_str())
        .filter_map(|caps| caps.get(1))
        .map(|m| leading_segment(m.as_str()))
        .find(|candidate| is_name_like(candidate))
        .map(str::to_string)
}

fn top_line_name(text: &NormalizedText) -> Option<String> {
    text.lines()
        .take(NAME_SCAN_LINES)
        .map(leading_segment)
        .find(|candidate| is_name_like(candidate))
        .map(str::to_string)
}

fn leading_segment(line: &str) -> &str {
    SEGMENT_SPLIT_RE
        .split(line)
        .next()
        .unwrap_or(line)
        .trim()
}

/// Title-cased (or all-caps), 2–4 alphabetic tokens, no digits or symbols, and
/// none of the heading or job-title words.
pub fn is_name_like(candidate: &str) -> bool {
    if candidate.is_empty() || candidate.len() > MAX_NAME_LEN {
        return false;
    }
    let tokens: Vec<&str> = candidate.split_whitespace().collect();
    if !(2..=4).contains(&tokens.len()) {
        return false;
    }
    tokens.iter().all(|token| {
        let mut chars = token.chars();
        let starts_upper = chars.next().is_some_and(|c| c.is_uppercase());
        let body_ok = token
            .chars()
            .all(|c| c.is_alphabetic() || matches!(c, '.' | '\'' | '’' | '-'));
        let lower = token.trim_end_matches('.').to_lowercase();
        starts_upper && body_ok && !NOT_NAME_WORDS.contains(&lower.as_str())
    })
}

/// Guesses a name from a file name such as `jane_doe_resume.pdf` or
/// `John-Smith-CV-2024.docx`.
pub fn name_from_source_id(source_id: &str) -> Option<String> {
    let base = source_id.rsplit(['/', '\\']).next().unwrap_or(source_id);
    let stem = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() <= 5 => stem,
        _ => base,
    };

    let tokens: Vec<String> = stem
        .split(|c: char| c == '_' || c == '-' || c == '.' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .filter(|t| t.chars().all(char::is_alphabetic))
        .filter(|t| !FILENAME_NOISE.contains(&t.to_lowercase().as_str()))
        .map(title_case)
        .collect();

    if !(2..=4).contains(&tokens.len()) {
        return None;
    }
    let guess = tokens.join(" ");
    is_name_like(&guess).then_some(guess)
}

fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Most name-like line near the top of the document; falls back to a guess from
/// the file name, then to `unknown`. A document without text gets no guess: every
/// field of an empty document stays `unknown`.
pub fn extract_name(text: &NormalizedText, source_id: &str) -> Extracted {
    if text.is_empty() {
        return Extracted::Unknown;
    }
    apply_rules(NAME_RULES, text)
        .or_else(|| name_from_source_id(source_id))
        .into()
}
