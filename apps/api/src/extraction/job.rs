//! Job description context: derives the keyword set a batch is ranked against.
//!
//! Built once per batch and shared read-only across every document.

use std::collections::HashSet;

use crate::extraction::vocabulary::{TermMatcher, VOCABULARY_MATCHERS};

/// Minimum similarity for two terms to count as the same skill when they are not
/// an exact match (e.g. "kubernetes" vs "kubernete").
const NEAR_MATCH_THRESHOLD: f64 = 0.85;
/// Near-matching short terms produces noise ("sql" vs "sass"), so it only applies
/// from this length up.
const NEAR_MATCH_MIN_LEN: usize = 5;
const MAX_PHRASE_TOKENS: usize = 3;
const MAX_PHRASE_LEN: usize = 32;

const PHRASE_STOPWORDS: &[&str] = &[
    "a", "an", "and", "or", "the", "of", "in", "on", "for", "with", "to", "we", "you", "our",
    "your", "is", "are", "be", "will", "must", "should", "plus", "etc", "experience", "years",
    "year", "required", "preferred", "requirements", "responsibilities", "nice", "have", "strong",
    "skills", "knowledge", "ability", "team", "work", "role", "about", "us", "including",
];

/// A keyword derived from the job description, in JD order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobKeyword {
    /// Lowercase identity, comparable with vocabulary keys.
    pub key: String,
    /// Casing as first written in the job description.
    pub display: String,
}

/// Read-only context derived from an optional job description.
#[derive(Debug, Default)]
pub struct JobContext {
    folded: String,
    keywords: Vec<JobKeyword>,
    extra_matchers: Vec<TermMatcher>,
}

impl JobContext {
    /// Builds the context. Blank text yields `None`: an absent job description is
    /// not an error, it only disables relevance weighting.
    pub fn from_text(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let mut keywords: Vec<(usize, JobKeyword)> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for matcher in VOCABULARY_MATCHERS.iter() {
            if let Some((offset, spelling)) = matcher.occurrences(trimmed).into_iter().next() {
                if seen.insert(matcher.key.clone()) {
                    keywords.push((
                        offset,
                        JobKeyword {
                            key: matcher.key.clone(),
                            display: spelling.to_string(),
                        },
                    ));
                }
            }
        }

        let mut extra_matchers = Vec::new();
        for (offset, phrase) in list_phrases(trimmed) {
            let key = phrase.to_lowercase();
            if seen.contains(&key) || covered_by_vocabulary(&phrase) {
                continue;
            }
            if let Some(matcher) = TermMatcher::new(&phrase, &[], false) {
                seen.insert(key.clone());
                keywords.push((
                    offset,
                    JobKeyword {
                        key,
                        display: phrase.clone(),
                    },
                ));
                extra_matchers.push(matcher);
            }
        }

        keywords.sort_by_key(|(offset, _)| *offset);

        Some(Self {
            folded: trimmed.to_lowercase(),
            keywords: keywords.into_iter().map(|(_, k)| k).collect(),
            extra_matchers,
        })
    }

    /// Keywords in the order they first appear in the job description.
    pub fn keywords(&self) -> &[JobKeyword] {
        &self.keywords
    }

    /// Terms taken from the job description that are not part of the fixed
    /// vocabulary; the ranker treats them as additional vocabulary.
    pub fn extra_matchers(&self) -> &[TermMatcher] {
        &self.extra_matchers
    }

    /// Whether a skill (by lowercase key) overlaps the job description, by exact
    /// key or near match.
    pub fn is_relevant(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.keywords.iter().any(|k| k.key == key)
            || self.keywords.iter().any(|k| is_near_match(&k.key, &key))
            || (key.chars().count() >= NEAR_MATCH_MIN_LEN
                && self
                    .folded
                    .split(|c: char| !c.is_alphanumeric())
                    .any(|token| is_near_match(token, &key)))
    }
}

/// Similar spellings of the same term, for terms long enough to compare safely.
pub fn is_near_match(a: &str, b: &str) -> bool {
    a.chars().count() >= NEAR_MATCH_MIN_LEN
        && b.chars().count() >= NEAR_MATCH_MIN_LEN
        && strsim::normalized_levenshtein(a, b) >= NEAR_MATCH_THRESHOLD
}

fn covered_by_vocabulary(phrase: &str) -> bool {
    VOCABULARY_MATCHERS.iter().any(|m| m.is_present(phrase))
}

/// Label fragments that introduce a list of skills ("Required:", "Tech stack",
/// "Nice to have:"). Lists under any other label (location, benefits) are ignored.
const SKILL_LABELS: &[&str] = &[
    "require", "must have", "must-have", "nice to have", "nice-to-have", "skill", "stack",
    "technolog", "tools", "qualification", "preferred", "bonus", "experience with",
];
const MAX_LABEL_WORDS: usize = 4;

fn is_skill_label(label: &str) -> bool {
    let label = label.to_lowercase();
    SKILL_LABELS.iter().any(|l| label.contains(l))
}

/// The label of a `Label: items` line, taken from the last sentence before the
/// colon so "Go developer. Required: Go" is labelled "Required".
fn line_label(line: &str) -> Option<(&str, &str)> {
    let (head, body) = line.split_once(':')?;
    let label = head.rsplit(['.', '!', '?']).next().unwrap_or(head).trim();
    let label = label.trim_start_matches(['-', '*', '•', '·']).trim();
    let words = label.split_whitespace().count();
    (1..=MAX_LABEL_WORDS).contains(&words).then_some((label, body))
}

/// A standalone short line such as "Requirements" or "About us".
fn is_heading(line: &str) -> bool {
    let t = line.trim();
    !t.is_empty()
        && !is_bullet(t)
        && t.split_whitespace().count() <= MAX_LABEL_WORDS
        && !t.contains([',', ';', '.'])
}

/// Short skill-like phrases from lists under a skill label: "Required: Kotlin,
/// Ktor, Exposed" yields Kotlin, Ktor, Exposed, as do bullets under a
/// "Requirements" heading.
fn list_phrases(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut line_start = 0;
    let mut in_skill_section = false;

    for line in text.split_inclusive('\n') {
        let offset_of = |body: &str| line_start + (line.len() - body.len());
        let trimmed = line.trim();

        let body = if let Some((label, body)) = line_label(line) {
            let skill = is_skill_label(label);
            if body.trim().is_empty() {
                // "Requirements:" on its own opens a section.
                in_skill_section = skill;
                None
            } else if is_bullet(line) {
                skill.then_some(body)
            } else {
                in_skill_section = false;
                skill.then_some(body)
            }
        } else if is_bullet(line) {
            in_skill_section.then_some(line)
        } else if is_heading(trimmed) {
            in_skill_section = is_skill_label(trimmed);
            None
        } else if in_skill_section && trimmed.contains([',', ';']) {
            Some(line)
        } else {
            if !trimmed.is_empty() {
                in_skill_section = false;
            }
            None
        };

        if let Some(body) = body {
            let mut cursor = offset_of(body);
            for piece in body.split([',', ';']) {
                let offset = cursor;
                cursor += piece.len() + 1;
                if let Some(phrase) = clean_phrase(piece) {
                    out.push((offset, phrase));
                }
            }
        }
        line_start += line.len();
    }

    out
}

fn is_bullet(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with(['-', '*', '•', '·'])
}

fn clean_phrase(piece: &str) -> Option<String> {
    let trimmed = piece
        .trim()
        .trim_start_matches(['-', '*', '•', '·'])
        .trim_end_matches(['.', ')', '!'])
        .trim_start_matches(['('])
        .trim();
    let trimmed = trimmed
        .strip_prefix("and ")
        .or_else(|| trimmed.strip_prefix("or "))
        .unwrap_or(trimmed)
        .trim();

    if trimmed.is_empty() || trimmed.len() > MAX_PHRASE_LEN {
        return None;
    }
    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if tokens.len() > MAX_PHRASE_TOKENS {
        return None;
    }
    let content_tokens = tokens
        .iter()
        .filter(|t| !PHRASE_STOPWORDS.contains(&t.to_lowercase().as_str()))
        .count();
    if content_tokens == 0 {
        return None;
    }
    // Skill names are written as proper nouns or acronyms in job ads.
    let first = tokens.first()?.chars().next()?;
    if !first.is_uppercase() {
        return None;
    }
    Some(trimmed.to_string())
}
