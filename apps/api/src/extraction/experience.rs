//! Years-of-experience extraction.
//!
//! Candidates, strongest first:
//! 1. a stated duration next to the word "experience" ("5+ years of experience")
//! 2. date-range arithmetic over the employment section (latest end − earliest start)
//! 3. any other stated duration ("over 10 yrs")
//!
//! Within a tier the first match in document order wins.

use std::sync::LazyLock;

use regex::Regex;

use crate::extraction::normalizer::NormalizedText;
use crate::extraction::sections::{tag_lines, Section};
use crate::models::candidate::Extracted;

const MAX_PLAUSIBLE_YEARS: f32 = 60.0;
/// Bytes of surrounding text inspected for an "experience" mention.
const CONTEXT_WINDOW: usize = 48;

static STATED_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\b(over|more\s+than|at\s+least|nearly|almost|about|around|approximately)\s+)?\b(\d{1,2}(?:\.\d{1,2})?)\s*(\+)?\s*(?:-\s*)?(?:years?|yrs?)\b(\s+old)?",
    )
    .expect("valid stated duration regex")
});

static DATE_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let month = r"(?:(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+|\d{1,2}\s*/\s*)";
    Regex::new(&format!(
        r"(?i)\b{month}?((?:19|20)\d{{2}})\s*(?:-|–|—|to|until|till)\s*{month}?((?:19|20)\d{{2}}|present|current|now|today|date)\b"
    ))
    .expect("valid date range regex")
});

#[derive(Debug, Clone, PartialEq)]
struct StatedDuration {
    value: String,
    in_experience_context: bool,
}

/// Best single years-of-experience candidate as free text ("5", "5+", "7.5"),
/// or `unknown`. `reference_year` stands in for "Present"/"Current" end dates.
pub fn extract_years_experience(text: &NormalizedText, reference_year: i32) -> Extracted {
    let stated = stated_durations(text.as_str());

    if let Some(best) = stated.iter().find(|s| s.in_experience_context) {
        return Extracted::Found(best.value.clone());
    }
    if let Some(span) = employment_span(text, reference_year) {
        return Extracted::Found(span);
    }
    stated
        .into_iter()
        .next()
        .map(|s| s.value)
        .into()
}

fn stated_durations(text: &str) -> Vec<StatedDuration> {
    STATED_DURATION_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if caps.get(4).is_some() {
                // "25 years old" is an age, not experience.
                return None;
            }
            let number = caps.get(2)?.as_str();
            let parsed: f32 = number.parse().ok()?;
            if parsed <= 0.0 || parsed > MAX_PLAUSIBLE_YEARS {
                return None;
            }
            let open_ended = caps.get(3).is_some()
                || caps.get(1).is_some_and(|q| {
                    let q = q.as_str().to_lowercase();
                    q == "over" || q.starts_with("more") || q.starts_with("at")
                });
            let value = if open_ended {
                format!("{number}+")
            } else {
                number.to_string()
            };
            Some(StatedDuration {
                value,
                in_experience_context: mentions_experience_nearby(text, whole.start(), whole.end()),
            })
        })
        .collect()
}

fn mentions_experience_nearby(text: &str, start: usize, end: usize) -> bool {
    let before_start = floor_char_boundary(text, start.saturating_sub(CONTEXT_WINDOW));
    let after_end = ceil_char_boundary(text, (end + CONTEXT_WINDOW).min(text.len()));
    let after = text[end..after_end].to_lowercase();
    let before = text[before_start..start].to_lowercase();
    // Only the current sentence/clause counts on the left side.
    let before = before.rsplit(['.', '\n', ';']).next().unwrap_or("");
    let after = after.split(['.', '\n', ';', ',']).next().unwrap_or("");
    let is_experience = |s: &str| {
        s.contains("experience")
            || s
                .split_whitespace()
                .any(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == "exp")
    };
    is_experience(after) || is_experience(before)
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx < text.len() && !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// Year ranges found in a set of lines as `(start, end)`; open-ended ranges end
/// at `reference_year`.
fn year_ranges<'a>(lines: impl Iterator<Item = &'a str>, reference_year: i32) -> Vec<(i32, i32)> {
    let mut ranges = Vec::new();
    for line in lines {
        for caps in DATE_RANGE_RE.captures_iter(line) {
            let Some(start) = caps.get(1).and_then(|m| m.as_str().parse::<i32>().ok()) else {
                continue;
            };
            let end = match caps.get(2).map(|m| m.as_str()) {
                Some(e) if e.chars().all(|c| c.is_ascii_digit()) => match e.parse::<i32>() {
                    Ok(year) => year,
                    Err(_) => continue,
                },
                Some(_) => reference_year,
                None => continue,
            };
            if start > reference_year || end < start {
                continue;
            }
            ranges.push((start, end.min(reference_year)));
        }
    }
    ranges
}

/// Span from the earliest employment start to the latest end. Ranges in an
/// employment section are preferred; without one, every range outside the
/// education section is used.
fn employment_span(text: &NormalizedText, reference_year: i32) -> Option<String> {
    let tagged = tag_lines(text);

    let mut ranges = year_ranges(
        tagged
            .iter()
            .filter(|(section, _)| *section == Section::Experience)
            .map(|(_, line)| *line),
        reference_year,
    );
    if ranges.is_empty() {
        ranges = year_ranges(
            tagged
                .iter()
                .filter(|(section, _)| *section != Section::Education)
                .map(|(_, line)| *line),
            reference_year,
        );
    }

    let earliest = ranges.iter().map(|(start, _)| *start).min()?;
    let latest = ranges.iter().map(|(_, end)| *end).max()?;
    let span = latest - earliest;
    Some(if span < 1 {
        "<1".to_string()
    } else {
        span.to_string()
    })
}
