//! Text Normalization
//!
//! Strips markup tags and collapses whitespace in raw record fields before
//! they are embedded. Every function here is total and idempotent.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Anything shaped like a markup tag: `<`, one or more non-`>` characters, `>`
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is a valid regex"));

/// Normalize a raw string: drop tags, collapse whitespace runs, trim.
///
/// Tags are replaced by a space rather than removed so that
/// `foo<br>bar` becomes `foo bar` instead of `foobar`.
pub fn normalize(raw: &str) -> String {
    let stripped = TAG_PATTERN.replace_all(raw, " ");
    collapse_whitespace(&stripped)
}

/// Normalize an arbitrary dataset value, coercing non-strings to text.
///
/// `null` becomes the empty string; numbers and booleans use their JSON
/// spelling; arrays and objects are serialized.
pub fn normalize_value(value: &Value) -> String {
    match value {
        Value::String(s) => normalize(s),
        Value::Null => String::new(),
        other => normalize(&other.to_string()),
    }
}

/// Join already-normalized parts with single spaces, skipping empty ones.
pub fn compose<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for part in parts {
        let part = part.as_ref();
        if part.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(part);
    }
    out
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True if `s` contains a tag-like substring
pub fn contains_markup(s: &str) -> bool {
    TAG_PATTERN.is_match(s)
}
