//! SQL Extractor
//!
//! Reduces a free-text model completion to a single SQL statement. The model
//! is asked for bare SQL but routinely wraps it in markdown fences, prefixes
//! it with `SQL:`, emits `<think>` blocks or adds an explanation afterwards.
//!
//! Extraction is layered:
//! 1. strip `<think>`/`</think>` tags and line-leading fence / `SQL:` markers
//! 2. take the first line that starts with a statement keyword, through the
//!    first `;` or the end of the text
//! 3. failing that, take the first line whose trimmed text starts with a
//!    keyword plus the non-blank lines that follow it
//! 4. drop a trailing fence and make sure the statement ends in exactly one `;`
//!
//! Only the shape of the text is checked. Nothing here parses SQL or knows
//! which tables exist.

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;

/// Leading keywords that mark the start of a statement
pub const SQL_KEYWORDS: [&str; 7] = ["select", "insert", "update", "delete", "create", "alter", "drop"];

const FENCE: &str = "```";
const TERMINATOR: char = ';';

lazy_static! {
    // Only the tags go; the reasoning text between them stays in place.
    static ref THINK_TAG: Regex = Regex::new(r"(?i)</?think>").expect("think tag pattern");
    static ref LEADING_MARKER: Regex =
        Regex::new(r"(?im)^(?:```sql|```|SQL:)\s*").expect("leading marker pattern");
    static ref STATEMENT: Regex = Regex::new(
        r"(?ims)^(?:SELECT|INSERT|UPDATE|DELETE|CREATE|ALTER|DROP)\s+.*?(?:;|\z)"
    )
    .expect("statement pattern");
}

/// Extract a single SQL statement from a raw completion.
///
/// Returns `None` when nothing statement-shaped is found; callers should ask
/// the user to rephrase rather than treat it as a fault.
pub fn extract_sql(raw: &str) -> Option<String> {
    let cleaned = strip_noise(raw);

    let candidate = STATEMENT
        .find(&cleaned)
        .map(|m| m.as_str().trim().to_string())
        .or_else(|| fallback_candidate(&cleaned))?;

    normalize(&candidate)
}

/// True when `text`, trimmed and lower-cased, begins with a statement keyword
pub fn starts_with_keyword(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    SQL_KEYWORDS.iter().any(|kw| lowered.starts_with(kw))
}

fn strip_noise(raw: &str) -> String {
    let without_tags = THINK_TAG.replace_all(raw.trim(), "");
    LEADING_MARKER
        .replace_all(without_tags.trim(), "")
        .trim()
        .to_string()
}

/// First keyword-led line plus the non-blank lines directly below it
fn fallback_candidate(cleaned: &str) -> Option<String> {
    let mut lines = cleaned
        .split('\n')
        .map(str::trim)
        .skip_while(|line| !starts_with_keyword(line));
    let first = lines.next()?;

    Some(
        std::iter::once(first)
            .chain(lines.take_while(|line| !line.is_empty()))
            .join(" "),
    )
}

fn normalize(candidate: &str) -> Option<String> {
    let mut sql = candidate.trim();
    if let Some(stripped) = sql.strip_suffix(FENCE) {
        sql = stripped.trim();
    }

    if sql.is_empty() || !starts_with_keyword(sql) {
        return None;
    }

    let body = sql.trim_end_matches(|c: char| c == TERMINATOR || c.is_whitespace());
    Some(format!("{}{}", body, TERMINATOR))
}
