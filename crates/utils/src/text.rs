//! Small text helpers shared by the study guide and the level view.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9A-Za-z_\s가-힣]").expect("valid non-word pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
static EDGE_DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-+|-+$").expect("valid dash pattern"));

/// Turns a heading into an anchor id. Hangul syllables survive, punctuation
/// does not, whitespace runs collapse to a single `-`.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    let dashed = WHITESPACE.replace_all(&stripped, "-");
    EDGE_DASHES.replace_all(&dashed, "").into_owned()
}

/// Returns the bracketed prefix of a title, e.g. `초급` for `[초급] 요약하기`.
pub fn bracket_tag(title: &str) -> Option<&str> {
    let rest = title.strip_prefix('[')?;
    let end = rest.find(']')?;
    let tag = &rest[..end];
    if tag.is_empty() { None } else { Some(tag) }
}
