// Topic labels and extractive summaries.
//
// A topic's name is its id followed by the four heaviest centroid terms,
// underscore-joined ("3_food_taste_fresh_price"). The helpers below turn any
// such label back into display keywords and a title.

use super::tfidf::Vocabulary;

/// Number of centroid terms used in a topic name.
pub const LABEL_TERMS: usize = 4;
/// Number of member reviews concatenated into a topic summary.
pub const SUMMARY_REVIEWS: usize = 4;
/// Summary length limit, in characters.
pub const SUMMARY_MAX_CHARS: usize = 600;
pub const NO_SUMMARY: &str = "No summary available.";

/// Label tokens that carry no meaning on their own (HTML residue, function words).
const LABEL_STOPWORDS: [&str; 12] = [
    "br", "the", "and", "for", "this", "that", "with", "from", "its", "was", "are", "have",
];

/// The `n` terms with the largest centroid weight, heaviest first. Equal
/// weights (zeros included) keep vocabulary order, so the result holds
/// `min(n, vocabulary.len())` terms.
pub fn top_terms<'a>(centroid: &[f64], vocabulary: &'a Vocabulary, n: usize) -> Vec<&'a str> {
    let mut ranked: Vec<(usize, f64)> = centroid.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(n)
        .filter_map(|(id, _)| vocabulary.term(id))
        .collect()
}

/// `"{id}_{term1}_{term2}_..."` from already-ranked terms.
pub fn topic_name(cluster_id: usize, terms: &[&str]) -> String {
    format!("{cluster_id}_{}", terms.join("_"))
}

/// Join the first few member texts and cap the result at
/// [`SUMMARY_MAX_CHARS`] characters, marking truncation with `…`.
pub fn extractive_summary<S: AsRef<str>>(member_texts: &[S]) -> String {
    if member_texts.is_empty() {
        return NO_SUMMARY.to_string();
    }
    let joined = member_texts
        .iter()
        .take(SUMMARY_REVIEWS)
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(" ");
    if joined.chars().count() > SUMMARY_MAX_CHARS {
        let mut truncated: String = joined.chars().take(SUMMARY_MAX_CHARS).collect();
        truncated.push('…');
        truncated
    } else {
        joined
    }
}

/// Meaningful words from an underscore-delimited topic label.
///
/// Drops numeric tokens (the topic id), single characters, and label stop
/// words, in label order.
pub fn keywords(topic_name: &str) -> Vec<String> {
    topic_name
        .split('_')
        .filter(|part| !is_digits(part))
        .filter(|part| part.chars().count() > 1)
        .filter(|part| !LABEL_STOPWORDS.contains(&part.to_lowercase().as_str()))
        .map(str::to_string)
        .collect()
}

/// Capitalized keywords joined by spaces, or the first 40 characters of the
/// raw label when no keyword survives.
pub fn topic_title(topic_name: &str) -> String {
    let words = keywords(topic_name);
    if words.is_empty() {
        return topic_name.chars().take(40).collect();
    }
    words
        .iter()
        .map(|w| capitalize(w))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_numeric)
}

/// Uppercase the first character and lowercase the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Five-star rendering of a rating, rounded and clamped to 1..=5 stars.
pub fn stars(score: f64) -> String {
    let filled = (score.round() as i64).clamp(1, 5) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}
