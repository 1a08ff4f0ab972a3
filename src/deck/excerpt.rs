pub const MAX_EXCERPT_CHARS: usize = 150;
pub const EXCERPT_CONTEXT: usize = 50;

fn is_boundary(c: char) -> bool {
    matches!(c, ' ' | '\n' | '\t')
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).find(|&start| haystack[start..start + needle.len()] == *needle)
}

/// Extract a human-readable snippet around the earliest query-term match.
///
/// Takes `EXCERPT_CONTEXT` characters either side of the match, extends both
/// ends to word boundaries, and marks trimmed ends with `...`. With no match
/// the text is truncated to `MAX_EXCERPT_CHARS`. Operates on characters, not
/// bytes, so multi-byte abstracts cannot be split mid-codepoint.
pub fn extract(query_terms: &[String], text: &str) -> String {
    extract_with(query_terms, text, MAX_EXCERPT_CHARS, EXCERPT_CONTEXT)
}

pub fn extract_with(query_terms: &[String], text: &str, max_len: usize, context: usize) -> String {
    if text.is_empty() || query_terms.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = text.chars().collect();
    // Same lowercasing rule as the scorer, folded char-by-char so indexes
    // still line up with `chars`.
    let lower: Vec<char> = chars
        .iter()
        .map(|c| c.to_lowercase().next().unwrap_or(*c))
        .collect();

    // Earliest match across all terms wins.
    let mut best_pos = chars.len();
    let mut matched_len = 0;
    for term in query_terms {
        let needle: Vec<char> = term.chars().collect();
        if let Some(pos) = find_chars(&lower, &needle) {
            if pos < best_pos {
                best_pos = pos;
                matched_len = needle.len();
            }
        }
    }

    if best_pos == chars.len() {
        if chars.len() <= max_len {
            return text.trim().to_string();
        }
        let head: String = chars[..max_len].iter().collect();
        return format!("{}...", head.trim());
    }

    let mut start = best_pos.saturating_sub(context);
    let mut end = (best_pos + matched_len + context).min(chars.len());

    // Never cut mid-word: walk both ends out to the nearest whitespace.
    if start > 0 {
        while start > 0 && !is_boundary(chars[start]) {
            start -= 1;
        }
        start += 1;
    }
    while end < chars.len() && !is_boundary(chars[end]) {
        end += 1;
    }

    let body: String = chars[start..end].iter().collect();
    let prefix = if start > 0 { "..." } else { "" };
    let suffix = if end < chars.len() { "..." } else { "" };
    format!("{prefix}{}{suffix}", body.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn windows_around_first_match_with_ellipses() {
        let text = format!(
            "{}attention {}",
            "alpha ".repeat(20),
            "beta ".repeat(20).trim_end()
        );
        let excerpt = extract(&terms(&["attention"]), &text);

        assert!(excerpt.starts_with("..."));
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.contains("attention"));
        // The matched word must survive intact, not split at a window edge.
        assert!(!excerpt.contains("attentio..."));
        assert!(!excerpt.contains("...ttention"));
    }

    #[test]
    fn match_at_text_start_has_no_leading_ellipsis() {
        let text = format!("attention {}", "beta ".repeat(40).trim_end());
        let excerpt = extract(&terms(&["attention"]), &text);
        assert!(excerpt.starts_with("attention"));
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn short_text_with_match_is_returned_whole() {
        let excerpt = extract(&terms(&["attention"]), "attention is all you need");
        assert_eq!(excerpt, "attention is all you need");
    }

    #[test]
    fn no_match_truncates_to_max_length() {
        let text = "word ".repeat(100);
        let excerpt = extract(&terms(&["quantum"]), &text);
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.chars().count() <= MAX_EXCERPT_CHARS + 3);
    }

    #[test]
    fn no_match_short_text_returned_trimmed() {
        let excerpt = extract(&terms(&["quantum"]), "  short abstract  ");
        assert_eq!(excerpt, "short abstract");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let excerpt = extract(&terms(&["attention"]), "Attention mechanisms matter");
        assert_eq!(excerpt, "Attention mechanisms matter");
    }

    #[test]
    fn unicode_case_folds_match_like_the_scorer() {
        // U+212A KELVIN SIGN lowercases to 'k' under full Unicode folding
        // but not under an ASCII-only fold.
        let text = format!(
            "{}the \u{212A}elvin scale sets absolute zero",
            "alpha ".repeat(30)
        );
        let excerpt = extract(&terms(&["kelvin"]), &text);
        assert!(excerpt.starts_with("..."));
        assert!(excerpt.contains("elvin scale"));
    }

    #[test]
    fn empty_inputs_yield_empty_excerpt() {
        assert_eq!(extract(&terms(&["x"]), ""), "");
        assert_eq!(extract(&[], "some text"), "");
    }

    #[test]
    fn earliest_term_wins() {
        let text = "the encoder uses attention before the decoder stage";
        let excerpt = extract_with(&terms(&["decoder", "encoder"]), text, 150, 3);
        assert!(excerpt.contains("encoder"));
    }

    #[test]
    fn multibyte_text_does_not_panic() {
        let text = "résumé of naïve Bayes — attention étude ".repeat(10);
        let excerpt = extract(&terms(&["attention"]), &text);
        assert!(excerpt.contains("attention"));
    }
}
