// Text normalization — the first stage of the topic pipeline.
//
// Everything downstream (tokenization, vocabulary, TF-IDF) assumes its input
// contains only lowercase ASCII letters separated by single spaces.

use std::sync::LazyLock;

use regex_lite::Regex;

static NON_ALPHA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z\s]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.*?>").unwrap());
static BARE_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"http\S+").unwrap());

/// Normalize raw review text for vectorizing.
///
/// Lowercases, replaces every non-letter with a space, then collapses runs of
/// whitespace and trims. Total and idempotent: `normalize(normalize(x)) ==
/// normalize(x)`.
pub fn normalize(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let letters_only = NON_ALPHA.replace_all(lower.trim(), " ");
    WHITESPACE.replace_all(&letters_only, " ").trim().to_string()
}

/// Split normalized text into tokens of two or more letters.
pub fn tokenize(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split(' ').filter(|t| t.len() >= 2)
}

/// Remove HTML tags and bare URLs from review text before display.
pub fn strip_html(text: &str) -> String {
    let without_tags = HTML_TAG.replace_all(text, "");
    BARE_URL.replace_all(&without_tags, "").trim().to_string()
}
