//! Summary Composer: a short synopsis built from the extracted fields, the
//! ranked skills and the document's own profile paragraph.

use crate::extraction::job::{is_near_match, JobContext};
use crate::extraction::normalizer::NormalizedText;
use crate::extraction::sections::{tag_lines, Section};
use crate::extraction::skills::RankedSkill;
use crate::models::candidate::CandidateFields;

/// Skills named in a single summary sentence.
const SUMMARY_SKILLS: usize = 5;
/// Job keywords listed as missing.
const MISSING_KEYWORDS: usize = 3;
const HEADLINE_SCAN_LINES: usize = 10;
const MAX_HEADLINE_WORDS: usize = 6;
const MAX_EXCERPT_CHARS: usize = 220;
const MIN_EXCERPT_CHARS: usize = 20;

const ROLE_WORDS: &[&str] = &[
    "engineer", "developer", "programmer", "manager", "analyst", "designer", "consultant",
    "scientist", "architect", "specialist", "director", "administrator", "coordinator",
    "technician", "officer", "accountant", "researcher", "lead", "intern", "devops", "sre",
    "nurse", "teacher", "recruiter", "writer", "marketer", "strategist", "owner",
];

/// Composes the candidate summary. Returns an empty string only when the source
/// document had no usable text; otherwise at least one generic sentence.
pub fn compose_summary(
    fields: &CandidateFields,
    skills: &[RankedSkill],
    text: &NormalizedText,
    job: Option<&JobContext>,
) -> String {
    if text.is_empty() {
        return String::new();
    }

    let subject = fields
        .candidate_name
        .as_option()
        .unwrap_or("The candidate")
        .to_string();

    let mut sentences = vec![role_sentence(
        &subject,
        find_headline(text).as_deref(),
        fields.years_experience.as_option(),
    )];

    if let Some(excerpt) = profile_excerpt(text) {
        sentences.push(excerpt);
    }

    match job {
        Some(job) => sentences.extend(fit_sentences(skills, job)),
        None if !skills.is_empty() => {
            sentences.push(format!("Key skills: {}.", join_names(skills.iter())));
        }
        None => {}
    }

    sentences.join(" ")
}

fn role_sentence(subject: &str, headline: Option<&str>, years: Option<&str>) -> String {
    match (headline, years) {
        (Some(headline), Some(years)) => format!(
            "{subject} is {} {headline} with {} of experience.",
            article(headline),
            years_phrase(years)
        ),
        (Some(headline), None) => format!("{subject} is {} {headline}.", article(headline)),
        (None, Some(years)) => format!("{subject} has {} of experience.", years_phrase(years)),
        (None, None) => format!(
            "{} résumé does not state a clear role or length of experience.",
            possessive(subject)
        ),
    }
}

fn fit_sentences(skills: &[RankedSkill], job: &JobContext) -> Vec<String> {
    let mut out = Vec::new();
    let relevant: Vec<&RankedSkill> = skills.iter().filter(|s| s.relevant).collect();
    let other: Vec<&RankedSkill> = skills.iter().filter(|s| !s.relevant).collect();

    if !relevant.is_empty() {
        out.push(format!(
            "Relevant to the role: {}.",
            join_names(relevant.iter().copied())
        ));
        if !other.is_empty() {
            out.push(format!("Other skills: {}.", join_names(other.iter().copied())));
        }
    } else if !skills.is_empty() {
        out.push(format!(
            "No direct overlap with the job description; strongest skills: {}.",
            join_names(skills.iter())
        ));
    } else {
        out.push("No skills from the job description were found.".to_string());
    }

    let keywords = job.keywords();
    if !keywords.is_empty() {
        let missing: Vec<&str> = keywords
            .iter()
            .filter(|k| {
                !skills
                    .iter()
                    .any(|s| s.key == k.key || (s.relevant && is_near_match(&s.key, &k.key)))
            })
            .map(|k| k.display.as_str())
            .collect();
        let covered = keywords.len() - missing.len();
        out.push(format!(
            "Covers {covered} of {} key terms from the job description.",
            keywords.len()
        ));
        if !missing.is_empty() {
            let shown: Vec<&str> = missing.into_iter().take(MISSING_KEYWORDS).collect();
            out.push(format!("Not evidenced: {}.", shown.join(", ")));
        }
    }

    out
}

fn join_names<'a>(skills: impl Iterator<Item = &'a RankedSkill>) -> String {
    skills
        .take(SUMMARY_SKILLS)
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn years_phrase(years: &str) -> String {
    match years {
        "<1" => "less than a year".to_string(),
        "1" => "1 year".to_string(),
        other => format!("{other} years"),
    }
}

fn article(word: &str) -> &'static str {
    match word.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

fn possessive(subject: &str) -> String {
    if subject.ends_with('s') {
        format!("{subject}'")
    } else {
        format!("{subject}'s")
    }
}

/// A short role line near the top ("Senior Backend Engineer").
fn find_headline(text: &NormalizedText) -> Option<String> {
    text.lines()
        .take(HEADLINE_SCAN_LINES)
        .flat_map(|line| line.split([',', '|', '•']).flat_map(|s| s.split(" - ")))
        .map(str::trim)
        .find(|segment| is_headline(segment))
        .map(str::to_string)
}

fn is_headline(segment: &str) -> bool {
    let words: Vec<&str> = segment.split_whitespace().collect();
    if words.is_empty() || words.len() > MAX_HEADLINE_WORDS {
        return false;
    }
    if segment.contains('@') || segment.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    let folded = segment.to_lowercase();
    if folded.contains("experience") || folded.contains("skills") {
        return false;
    }
    words.iter().any(|w| {
        let w = w
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        ROLE_WORDS.contains(&w.as_str())
    })
}

/// First sentence of the Summary/Profile section, shortened at a word boundary.
fn profile_excerpt(text: &NormalizedText) -> Option<String> {
    let paragraph: Vec<&str> = tag_lines(text)
        .into_iter()
        .skip_while(|(section, _)| *section != Section::Profile)
        .take_while(|(section, _)| *section == Section::Profile)
        .map(|(_, line)| line)
        .collect();
    let joined = paragraph.join(" ");
    let sentence = first_sentence(&joined);
    if sentence.chars().count() < MIN_EXCERPT_CHARS {
        return None;
    }
    Some(shorten(sentence, MAX_EXCERPT_CHARS))
}

fn first_sentence(text: &str) -> &str {
    let bytes = text.as_bytes();
    for (i, window) in bytes.windows(2).enumerate() {
        if matches!(window[0], b'.' | b'!' | b'?') && window[1] == b' ' {
            return &text[..=i];
        }
    }
    text.trim()
}

fn shorten(sentence: &str, max_chars: usize) -> String {
    if sentence.chars().count() <= max_chars {
        let mut s = sentence.trim().to_string();
        if !s.ends_with(['.', '!', '?']) {
            s.push('.');
        }
        return s;
    }
    let cut: String = sentence.chars().take(max_chars).collect();
    let cut = match cut.rfind(' ') {
        Some(idx) => &cut[..idx],
        None => cut.as_str(),
    };
    format!("{}…", cut.trim_end_matches([',', ';', ':', ' ']))
}
