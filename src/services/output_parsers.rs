//! Heuristic extraction of structure from free-text LLM output.
//!
//! Everything here is a pure function over the response text. The
//! heuristics are keyword and line based and make no attempt at semantic
//! understanding.

use crate::domain::models::Epic;

/// Number of concurrent calls made by a variation agent.
pub const VARIATION_COUNT: usize = 5;
/// Upper bound on extracted questions. Never padded.
pub const MAX_QUESTIONS: usize = 10;
pub const MAX_SUGGESTIONS: usize = 5;
pub const MAX_CRITIQUE_LINES: usize = 3;
pub const MAX_ALTERNATIVE_IDEAS: usize = 5;
pub const MAX_COMPETITOR_LINES: usize = 5;

const SUGGESTION_KEYWORDS: &[&str] = &["suggest", "recommend", "should", "could", "consider"];
const CRITIQUE_KEYWORDS: &[&str] = &["concern", "issue", "problem", "risk", "challenge"];
const ALTERNATIVE_KEYWORDS: &[&str] = &["alternative", "instead", "option", "idea", "approach"];
const COMPETITOR_KEYWORDS: &[&str] = &["competitor", "market", "advantage", "differentiat"];

/// Minimum length (exclusive) of a suggestion or alternative-idea line.
const MIN_STATEMENT_LEN: usize = 20;
/// Minimum length (exclusive) of a question line.
const MIN_QUESTION_LEN: usize = 10;

fn mentions_any(line: &str, keywords: &[&str]) -> bool {
    let lower = line.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

fn keyword_lines<'a>(
    content: &'a str,
    keywords: &'a [&'a str],
    min_len: usize,
) -> impl Iterator<Item = &'a str> + 'a {
    content
        .lines()
        .map(str::trim)
        .filter(move |line| line.chars().count() > min_len && mentions_any(line, keywords))
}

/// Lines that read like recommendations.
pub fn extract_suggestions(content: &str) -> Vec<String> {
    keyword_lines(content, SUGGESTION_KEYWORDS, MIN_STATEMENT_LEN)
        .take(MAX_SUGGESTIONS)
        .map(ToString::to_string)
        .collect()
}

/// Lines raising concerns, joined by newlines. `None` if there are none.
pub fn extract_critique(content: &str) -> Option<String> {
    join_nonempty(keyword_lines(content, CRITIQUE_KEYWORDS, 0).take(MAX_CRITIQUE_LINES))
}

/// Lines about competitors and positioning, joined by newlines.
pub fn extract_competitor_analysis(content: &str) -> Option<String> {
    join_nonempty(keyword_lines(content, COMPETITOR_KEYWORDS, 0).take(MAX_COMPETITOR_LINES))
}

/// Lines proposing other ways to do things.
pub fn extract_alternative_ideas(content: &str) -> Vec<String> {
    keyword_lines(content, ALTERNATIVE_KEYWORDS, MIN_STATEMENT_LEN)
        .take(MAX_ALTERNATIVE_IDEAS)
        .map(ToString::to_string)
        .collect()
}

/// Lines containing a question mark, cut after the first one.
pub fn extract_questions(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| line.contains('?') && line.chars().count() > MIN_QUESTION_LEN)
        .filter_map(|line| line.split_once('?').map(|(q, _)| format!("{q}?")))
        .take(MAX_QUESTIONS)
        .collect()
}

/// Length-based confidence placeholder. Monotonic in word count.
pub fn confidence_from_length(content: &str) -> f64 {
    match content.split_whitespace().count() {
        n if n > 300 => 0.9,
        n if n > 200 => 0.8,
        n if n > 100 => 0.7,
        _ => 0.6,
    }
}

/// Split epic-generator output on lines starting with `EPIC` or `**EPIC`.
///
/// The title is the header with every `**`, `EPIC` and `:` removed; the
/// non-empty lines that follow, up to the next header, form the content.
/// Text before the first header is dropped.
pub fn parse_epics(content: &str) -> Vec<Epic> {
    let mut epics: Vec<Epic> = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in content.lines().map(str::trim) {
        if line.starts_with("**EPIC") || line.starts_with("EPIC") {
            if let Some((title, body)) = current.take() {
                epics.push(make_epic(epics.len() + 1, title, &body));
            }
            let title = line.replace("**", "").replace("EPIC", "").replace(':', "");
            current = Some((title.trim().to_string(), Vec::new()));
        } else if let Some((_, body)) = current.as_mut() {
            if !line.is_empty() {
                body.push(line);
            }
        }
    }

    if let Some((title, body)) = current {
        epics.push(make_epic(epics.len() + 1, title, &body));
    }
    epics
}

fn make_epic(number: usize, title: String, body: &[&str]) -> Epic {
    Epic {
        number,
        title,
        content: body.join("\n").trim().to_string(),
    }
}

fn join_nonempty<'a>(lines: impl Iterator<Item = &'a str>) -> Option<String> {
    let joined = lines.collect::<Vec<_>>().join("\n");
    (!joined.is_empty()).then_some(joined)
}
