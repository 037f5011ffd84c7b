//! Skill vocabulary: the fixed set of terms the ranker recognizes, and the
//! boundary-aware matcher shared by the ranker and the job-description parser.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// A vocabulary term. `key` is the canonical lowercase identity used for
/// deduplication; `aliases` are alternative spellings that count as the same skill.
#[derive(Debug, Clone, Copy)]
pub struct SkillTerm {
    pub key: &'static str,
    pub aliases: &'static [&'static str],
    /// Terms that collide with ordinary English words only match with exact casing.
    pub case_sensitive: bool,
    /// Patterns in which a match is not the skill ("American Express").
    pub shadowed_by: &'static [&'static str],
}

const fn term(key: &'static str) -> SkillTerm {
    SkillTerm {
        key,
        aliases: &[],
        case_sensitive: false,
        shadowed_by: &[],
    }
}

const fn aliased(key: &'static str, aliases: &'static [&'static str]) -> SkillTerm {
    SkillTerm {
        key,
        aliases,
        case_sensitive: false,
        shadowed_by: &[],
    }
}

const fn exact(key: &'static str, aliases: &'static [&'static str]) -> SkillTerm {
    SkillTerm {
        key,
        aliases,
        case_sensitive: true,
        shadowed_by: &[],
    }
}

const fn exact_except(
    key: &'static str,
    aliases: &'static [&'static str],
    shadowed_by: &'static [&'static str],
) -> SkillTerm {
    SkillTerm {
        key,
        aliases,
        case_sensitive: true,
        shadowed_by,
    }
}

pub const SKILL_VOCABULARY: &[SkillTerm] = &[
    // Languages
    term("python"),
    term("java"),
    aliased("javascript", &["js", "ecmascript"]),
    aliased("typescript", &["ts"]),
    exact("Go", &["Golang", "golang"]),
    term("rust"),
    term("c++"),
    term("c#"),
    term("ruby"),
    term("php"),
    term("kotlin"),
    exact("Swift", &[]),
    term("scala"),
    term("perl"),
    term("haskell"),
    term("elixir"),
    term("clojure"),
    term("dart"),
    term("matlab"),
    term("sql"),
    term("bash"),
    term("powershell"),
    term("html"),
    term("css"),
    // Frameworks and runtimes
    term("react"),
    aliased("angular", &["angularjs"]),
    aliased("vue", &["vue.js", "vuejs"]),
    aliased("next.js", &["nextjs"]),
    exact("Node.js", &["node.js", "NodeJS", "Nodejs", "nodejs", "Node"]),
    exact_except("Express", &["Express.js", "express.js", "ExpressJS"], &["American Express"]),
    term("django"),
    term("flask"),
    term("fastapi"),
    exact_except(
        "Spring",
        &["Spring Framework", "Spring MVC"],
        &[r"Spring\s+(?:(?:19|20)\d{2}|semester|term|quarter|break|session)"],
    ),
    term("spring boot"),
    aliased("ruby on rails", &["rails"]),
    term("laravel"),
    term(".net"),
    term("asp.net"),
    term("graphql"),
    exact("REST", &["RESTful", "REST API", "REST APIs"]),
    term("grpc"),
    term("tailwind"),
    term("redux"),
    term("flutter"),
    term("react native"),
    // Data and ML
    aliased("postgresql", &["postgres"]),
    term("mysql"),
    term("sqlite"),
    aliased("mongodb", &["mongo"]),
    term("redis"),
    term("elasticsearch"),
    term("cassandra"),
    term("dynamodb"),
    term("snowflake"),
    term("bigquery"),
    term("kafka"),
    term("rabbitmq"),
    aliased("apache spark", &["spark", "pyspark"]),
    term("hadoop"),
    term("airflow"),
    term("dbt"),
    term("pandas"),
    term("numpy"),
    term("scikit-learn"),
    term("tensorflow"),
    term("pytorch"),
    term("keras"),
    aliased("machine learning", &["ml"]),
    term("deep learning"),
    aliased("natural language processing", &["nlp"]),
    term("computer vision"),
    term("data analysis"),
    term("data engineering"),
    term("statistics"),
    term("tableau"),
    aliased("power bi", &["powerbi"]),
    exact("Excel", &["MS Excel", "Microsoft Excel"]),
    term("etl"),
    // Cloud and infrastructure
    aliased("aws", &["amazon web services"]),
    aliased("azure", &["microsoft azure"]),
    aliased("gcp", &["google cloud", "google cloud platform"]),
    term("docker"),
    aliased("kubernetes", &["k8s"]),
    term("terraform"),
    term("ansible"),
    term("helm"),
    term("jenkins"),
    term("github actions"),
    term("gitlab ci"),
    aliased("ci/cd", &["ci cd", "continuous integration"]),
    term("linux"),
    term("nginx"),
    term("serverless"),
    term("microservices"),
    term("distributed systems"),
    term("devops"),
    term("prometheus"),
    term("grafana"),
    term("git"),
    // Practices and domains
    term("agile"),
    term("scrum"),
    term("jira"),
    term("tdd"),
    term("unit testing"),
    term("system design"),
    term("security"),
    term("networking"),
    term("embedded"),
    term("figma"),
    term("ux"),
    term("product management"),
    term("project management"),
    term("leadership"),
    term("communication"),
    term("salesforce"),
    exact("SAP", &[]),
    term("seo"),
];

/// Compiled matcher for one term (canonical key plus every alias).
#[derive(Debug)]
pub struct TermMatcher {
    pub key: String,
    regex: Regex,
    shadows: Option<Regex>,
    /// Lowercase leading word of every spelling. A term can only occur in a text
    /// whose folded view contains one of these. Empty when a spelling is not ASCII,
    /// since Unicode lowercasing and regex case folding can disagree there.
    needles: Vec<String>,
}

impl TermMatcher {
    /// Builds a matcher for a term and its aliases. Returns `None` if the term is
    /// blank after trimming.
    pub fn new(key: &str, aliases: &[&str], case_sensitive: bool) -> Option<Self> {
        Self::build(key, aliases, case_sensitive, &[])
    }

    fn build(
        key: &str,
        aliases: &[&str],
        case_sensitive: bool,
        shadowed_by: &[&str],
    ) -> Option<Self> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        let mut spellings: Vec<&str> = std::iter::once(key)
            .chain(aliases.iter().copied())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        // Longest spelling first so "spring boot" wins over "spring" at the same offset.
        spellings.sort_by_key(|s| std::cmp::Reverse(s.len()));
        let pattern = spellings
            .iter()
            .map(|s| regex::escape(s).replace(' ', r"\s+"))
            .collect::<Vec<_>>()
            .join("|");
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(!case_sensitive)
            .build()
            .ok()?;
        let shadows = if shadowed_by.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(&shadowed_by.join("|"))
                    .case_insensitive(!case_sensitive)
                    .build()
                    .ok()?,
            )
        };
        let needles = if spellings.iter().all(|s| s.is_ascii()) {
            spellings
                .iter()
                .filter_map(|s| s.split_whitespace().next())
                .map(str::to_ascii_lowercase)
                .collect()
        } else {
            Vec::new()
        };
        Some(Self {
            key: key.to_lowercase(),
            regex,
            shadows,
            needles,
        })
    }

    /// Cheap screen against a lowercase view of the text: `false` means the term
    /// cannot occur in it.
    pub fn may_occur_in(&self, folded: &str) -> bool {
        self.needles.is_empty() || self.needles.iter().any(|n| folded.contains(n.as_str()))
    }

    /// All boundary-respecting occurrences as `(byte_offset, matched_text)`.
    pub fn occurrences<'t>(&self, text: &'t str) -> Vec<(usize, &'t str)> {
        let shadowed = self.shadowed_ranges(text);
        self.regex
            .find_iter(text)
            .filter(|m| is_term_boundary(text, m.start(), m.end()))
            .filter(|m| !shadowed.iter().any(|(s, e)| *s <= m.start() && m.end() <= *e))
            .map(|m| (m.start(), m.as_str()))
            .collect()
    }

    pub fn is_present(&self, text: &str) -> bool {
        !self.occurrences(text).is_empty()
    }

    fn shadowed_ranges(&self, text: &str) -> Vec<(usize, usize)> {
        self.shadows
            .as_ref()
            .map(|re| re.find_iter(text).map(|m| (m.start(), m.end())).collect())
            .unwrap_or_default()
    }
}

/// Matchers for the fixed vocabulary, compiled once.
pub static VOCABULARY_MATCHERS: LazyLock<Vec<TermMatcher>> = LazyLock::new(|| {
    SKILL_VOCABULARY
        .iter()
        .filter_map(|t| TermMatcher::build(t.key, t.aliases, t.case_sensitive, t.shadowed_by))
        .collect()
});

/// A match is a whole term only if it is not glued to surrounding word characters.
/// `+` and `#` count as word characters after a term so "C" never matches inside "C++".
fn is_term_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    let is_glue = |c: char| c.is_alphanumeric() || c == '_';
    let before_ok = before.map_or(true, |c| !is_glue(c));
    let after_ok = after.map_or(true, |c| !(is_glue(c) || c == '+' || c == '#'));
    before_ok && after_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(key: &str) -> &'static TermMatcher {
        VOCABULARY_MATCHERS
            .iter()
            .find(|m| m.key == key)
            .unwrap()
    }

    #[test]
    fn test_java_does_not_match_inside_javascript() {
        assert!(!matcher("java").is_present("Senior JavaScript developer"));
        assert!(matcher("javascript").is_present("Senior JavaScript developer"));
    }

    #[test]
    fn test_symbol_terms_match() {
        assert!(matcher("c++").is_present("Languages: C++, Python"));
        assert!(matcher("c#").is_present("Built services in C# and F#"));
        assert!(matcher(".net").is_present("Experience with .NET Core"));
        assert!(matcher("node.js").is_present("APIs in Node.js"));
    }

    #[test]
    fn test_go_is_case_sensitive() {
        assert!(matcher("go").is_present("Backend services in Go"));
        assert!(!matcher("go").is_present("ready to go the extra mile"));
        assert!(matcher("go").is_present("golang microservices"));
    }

    #[test]
    fn test_collision_prone_frameworks_are_case_sensitive() {
        assert!(matcher("node.js").is_present("REST APIs on Node and Postgres"));
        assert!(!matcher("node.js").is_present("each node in the cluster"));
        assert!(matcher("express").is_present("Node.js, Express, MongoDB"));
        assert!(!matcher("express").is_present("happy to express ideas clearly"));
        assert!(matcher("spring").is_present("Java, Spring, Hibernate"));
        assert!(!matcher("spring").is_present("we spring into action"));
    }

    #[test]
    fn test_shadowing_phrases_are_not_skills() {
        assert!(!matcher("express").is_present("Analyst at American Express"));
        assert!(!matcher("spring").is_present("Exchange student, Spring 2020 semester"));
        assert!(!matcher("spring").is_present("Teaching assistant, Spring term"));
        assert!(matcher("express").is_present("American Express, backend in Express"));
    }

    #[test]
    fn test_folded_screen_is_a_necessary_condition() {
        assert!(matcher("python").may_occur_in("pandas and python"));
        assert!(!matcher("python").may_occur_in("java only"));
        assert!(matcher("kubernetes").may_occur_in("ran k8s clusters"));
        assert!(matcher("machine learning").may_occur_in("machine\nlearning"));
        let accented = TermMatcher::new("Café", &[], false).unwrap();
        assert!(accented.may_occur_in("anything"));
    }

    #[test]
    fn test_occurrences_keep_document_casing() {
        let found = matcher("python").occurrences("python, PYTHON and Python");
        let spellings: Vec<&str> = found.iter().map(|(_, s)| *s).collect();
        assert_eq!(spellings, vec!["python", "PYTHON", "Python"]);
    }

    #[test]
    fn test_multi_word_terms_tolerate_line_breaks() {
        assert!(matcher("machine learning").is_present("machine\nlearning pipelines"));
    }

    #[test]
    fn test_aliases_map_to_canonical_key() {
        let m = matcher("postgresql");
        assert!(m.is_present("Postgres 14"));
        assert_eq!(m.key, "postgresql");
    }

    #[test]
    fn test_vocabulary_keys_are_unique() {
        let mut keys: Vec<String> = VOCABULARY_MATCHERS.iter().map(|m| m.key.clone()).collect();
        let before = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(before, keys.len());
        assert_eq!(before, SKILL_VOCABULARY.len());
    }
}
