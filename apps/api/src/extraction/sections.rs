use crate::extraction::normalizer::NormalizedText;

/// Résumé section a line belongs to, determined by the closest heading above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Lines before the first recognized heading (name, title, contact line).
    Preamble,
    Profile,
    Experience,
    Education,
    Skills,
    Other,
}

const PROFILE_HEADINGS: &[&str] = &[
    "summary",
    "professional summary",
    "career summary",
    "profile",
    "professional profile",
    "about",
    "about me",
    "objective",
    "career objective",
    "overview",
];

const EXPERIENCE_HEADINGS: &[&str] = &[
    "experience",
    "work experience",
    "professional experience",
    "relevant experience",
    "employment",
    "employment history",
    "work history",
    "career history",
];

const EDUCATION_HEADINGS: &[&str] = &[
    "education",
    "academic background",
    "academic history",
    "qualifications",
    "education and training",
];

const SKILLS_HEADINGS: &[&str] = &[
    "skills",
    "technical skills",
    "core skills",
    "key skills",
    "core competencies",
    "competencies",
    "technologies",
    "tech stack",
];

const OTHER_HEADINGS: &[&str] = &[
    "projects",
    "certifications",
    "certificates",
    "languages",
    "interests",
    "hobbies",
    "awards",
    "achievements",
    "publications",
    "references",
    "volunteering",
    "volunteer experience",
    "contact",
    "contact information",
    "personal details",
    "courses",
    "training",
];

/// Classifies a line as a section heading. Only short, standalone lines qualify:
/// "Experience", "WORK EXPERIENCE", "Education:".
pub fn classify_heading(line: &str) -> Option<Section> {
    let folded = line
        .trim()
        .trim_end_matches(':')
        .trim()
        .to_lowercase()
        .replace('&', "and");
    if folded.is_empty() || folded.split_whitespace().count() > 4 {
        return None;
    }
    let table: [(&[&str], Section); 5] = [
        (PROFILE_HEADINGS, Section::Profile),
        (EXPERIENCE_HEADINGS, Section::Experience),
        (EDUCATION_HEADINGS, Section::Education),
        (SKILLS_HEADINGS, Section::Skills),
        (OTHER_HEADINGS, Section::Other),
    ];
    table
        .iter()
        .find(|(headings, _)| headings.contains(&folded.as_str()))
        .map(|(_, section)| *section)
}

/// Every non-heading line tagged with the section it falls under, in document order.
pub fn tag_lines(text: &NormalizedText) -> Vec<(Section, &str)> {
    let mut current = Section::Preamble;
    let mut out = Vec::new();
    for line in text.lines() {
        match classify_heading(line) {
            Some(section) => current = section,
            None => out.push((current, line)),
        }
    }
    out
}
