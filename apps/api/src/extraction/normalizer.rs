//! Text Normalizer: turns decoder output into a stable display string plus a
//! case-folded view used for matching.
//!
//! Line structure is kept (one logical line per `\n`, paragraphs separated by a
//! single blank line) because the name and section heuristics depend on it.

/// Normalized document text. `text` keeps original casing for display-quality
/// fields; `folded` is the lowercase view the skill matchers screen against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    text: String,
    folded: String,
}

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn folded(&self) -> &str {
        &self.folded
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Non-empty lines in document order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().filter(|l| !l.is_empty())
    }
}

/// Normalizes arbitrary decoder output. Total: empty or malformed input yields an
/// empty (or partially cleaned) string, never an error.
pub fn normalize(raw: &str) -> NormalizedText {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut lines: Vec<String> = Vec::new();
    for line in unified.split('\n') {
        let cleaned: String = line
            .chars()
            .map(|c| match c {
                '\t' | '\u{00A0}' | '\u{2007}' | '\u{202F}' => ' ',
                c if c.is_control() => ' ',
                c => c,
            })
            .collect();
        let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        lines.push(collapsed);
    }

    let joined = join_hyphenated_breaks(lines);

    let mut text = String::with_capacity(raw.len());
    let mut pending_break = false;
    for line in joined {
        if line.is_empty() {
            pending_break = !text.is_empty();
            continue;
        }
        if !text.is_empty() {
            text.push_str(if pending_break { "\n\n" } else { "\n" });
        }
        text.push_str(&line);
        pending_break = false;
    }

    let folded = text.to_lowercase();
    NormalizedText { text, folded }
}

/// Re-joins words split across lines by a trailing hyphen (`soft-` / `ware`),
/// as PDF text extraction often produces.
fn join_hyphenated_breaks(lines: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut iter = lines.into_iter().peekable();

    while let Some(mut line) = iter.next() {
        while ends_with_word_hyphen(&line) {
            let next_starts_lower = iter
                .peek()
                .and_then(|n| n.chars().next())
                .is_some_and(|c| c.is_lowercase());
            if !next_starts_lower {
                break;
            }
            let Some(next) = iter.next() else { break };
            line.pop();
            match next.split_once(' ') {
                Some((head, rest)) => {
                    line.push_str(head);
                    out.push(line);
                    line = rest.to_string();
                }
                None => line.push_str(&next),
            }
        }
        out.push(line);
    }

    out
}

fn ends_with_word_hyphen(line: &str) -> bool {
    let mut rev = line.chars().rev();
    matches!(
        (rev.next(), rev.next()),
        (Some('-'), Some(c)) if c.is_alphabetic() && c.is_lowercase()
    )
}
