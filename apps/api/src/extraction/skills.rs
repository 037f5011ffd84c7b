//! Skill Ranker: ranks vocabulary mentions in a document, optionally boosted by
//! overlap with a job description.
//!
//! Ordering: relevant-to-JD tier first, then mention count (descending), then
//! first occurrence. Without a job description every skill is in the same tier.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::extraction::job::JobContext;
use crate::extraction::normalizer::NormalizedText;
use crate::extraction::vocabulary::{TermMatcher, VOCABULARY_MATCHERS};

pub const DEFAULT_TOP_SKILLS: usize = 8;

/// A skill mention aggregated over one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedSkill {
    /// Spelling as first seen in the document.
    pub name: String,
    /// Lowercase vocabulary identity.
    pub key: String,
    pub mentions: usize,
    pub first_offset: usize,
    /// Overlaps the job description (always false without one).
    pub relevant: bool,
}

struct Occurrence<'t> {
    key: &'t str,
    start: usize,
    end: usize,
    spelling: &'t str,
}

/// Ranks skills mentioned in `text`, truncated to `limit`. Empty text yields an
/// empty list.
pub fn rank_skills(
    text: &NormalizedText,
    job: Option<&JobContext>,
    limit: usize,
) -> Vec<RankedSkill> {
    if text.is_empty() || limit == 0 {
        return Vec::new();
    }

    let extra: &[TermMatcher] = job.map(JobContext::extra_matchers).unwrap_or_default();
    let occurrences = non_overlapping(
        VOCABULARY_MATCHERS
            .iter()
            .chain(extra.iter())
            .filter(|matcher| matcher.may_occur_in(text.folded()))
            .flat_map(|matcher| {
                matcher
                    .occurrences(text.as_str())
                    .into_iter()
                    .map(move |(start, spelling)| Occurrence {
                        key: matcher.key.as_str(),
                        start,
                        end: start + spelling.len(),
                        spelling,
                    })
            })
            .collect(),
    );

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut skills: Vec<RankedSkill> = Vec::new();
    for occ in occurrences {
        match index.get(occ.key) {
            Some(&i) => skills[i].mentions += 1,
            None => {
                index.insert(occ.key, skills.len());
                skills.push(RankedSkill {
                    name: occ.spelling.split_whitespace().collect::<Vec<_>>().join(" "),
                    key: occ.key.to_string(),
                    mentions: 1,
                    first_offset: occ.start,
                    relevant: job.is_some_and(|j| j.is_relevant(occ.key)),
                });
            }
        }
    }

    skills.sort_by_key(|s| (Reverse(s.relevant), Reverse(s.mentions), s.first_offset));

    let mut seen_names: HashSet<String> = HashSet::new();
    skills.retain(|s| seen_names.insert(s.name.to_lowercase()));
    skills.truncate(limit);
    skills
}

/// Keeps the leftmost-longest occurrence where terms overlap, so "React Native"
/// does not also count as "React" and "Spring Boot" not as "Spring". Output is in
/// document order.
fn non_overlapping(mut occurrences: Vec<Occurrence<'_>>) -> Vec<Occurrence<'_>> {
    occurrences.sort_by_key(|o| (o.start, Reverse(o.end)));
    let mut kept: Vec<Occurrence<'_>> = Vec::with_capacity(occurrences.len());
    let mut covered_until = 0;
    for occ in occurrences {
        if occ.start < covered_until {
            continue;
        }
        covered_until = occ.end;
        kept.push(occ);
    }
    kept
}

/// Display names of ranked skills, in rank order.
pub fn skill_names(skills: &[RankedSkill]) -> Vec<String> {
    skills.iter().map(|s| s.name.clone()).collect()
}
