use crate::deck::model::IndexEntry;

pub const WEIGHT_TITLE: f64 = 3.0;
pub const WEIGHT_ABSTRACT: f64 = 2.0;
pub const WEIGHT_SUMMARY: f64 = 1.5;
pub const WEIGHT_TOPIC: f64 = 1.0;

/// How many query terms appear in `text` as case-insensitive substrings.
///
/// Presence-counted, not occurrence-counted: a term repeated five times in
/// the text still contributes exactly 1.
fn count_matches(text: &str, query_terms: &[String]) -> usize {
    let lower = text.to_lowercase();
    query_terms
        .iter()
        .filter(|term| lower.contains(term.as_str()))
        .count()
}

/// Weighted relevance of a paper against tokenized query terms.
///
/// Fields and weights: title 3.0, abstract 2.0, summary (if present) 1.5,
/// each topic tag 1.0. Zero exactly when no term matches any field.
pub fn relevance(query_terms: &[String], entry: &IndexEntry, summary: Option<&str>) -> f64 {
    if query_terms.is_empty() {
        return 0.0;
    }

    let mut score = 0.0;
    score += count_matches(&entry.title, query_terms) as f64 * WEIGHT_TITLE;
    score += count_matches(&entry.abstract_text, query_terms) as f64 * WEIGHT_ABSTRACT;
    if let Some(summary) = summary {
        score += count_matches(summary, query_terms) as f64 * WEIGHT_SUMMARY;
    }
    for topic in &entry.topics {
        score += count_matches(topic, query_terms) as f64 * WEIGHT_TOPIC;
    }
    score
}
