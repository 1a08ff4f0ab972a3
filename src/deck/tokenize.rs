use regex::Regex;
use std::sync::LazyLock;

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9]+").expect("word pattern is valid"));

/// Tokenize free text into lowercase word tokens.
///
/// Lowercases, extracts maximal `[a-z0-9]` runs, and drops single-character
/// tokens except the words "a" and "i". Both the search engine and the export
/// query filter go through this one function: "relevance > 0" and "matches
/// filter" must agree on what a token is.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD_PATTERN
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .filter(|word| word.len() > 1 || word == "a" || word == "i")
        .collect()
}

/// Tokenize a query, dropping repeated terms (first occurrence wins) so a
/// repeated query word cannot double-count a field during scoring.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    tokenize(query)
        .into_iter()
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits_on_non_alphanumerics() {
        assert_eq!(
            tokenize("Attention-Is All_You Need!"),
            ["attention", "is", "all", "you", "need"]
        );
    }

    #[test]
    fn drops_single_chars_except_a_and_i() {
        assert_eq!(tokenize("a b i c 7 x2"), ["a", "i", "x2"]);
    }

    #[test]
    fn keeps_digits() {
        assert_eq!(tokenize("GPT-4 scores 90%"), ["gpt", "scores", "90"]);
    }

    #[test]
    fn empty_and_punctuation_only_yield_nothing() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("...!?--").is_empty());
    }

    #[test]
    fn query_terms_deduplicate_preserving_order() {
        assert_eq!(
            query_terms("attention attention mechanisms attention"),
            ["attention", "mechanisms"]
        );
    }
}
