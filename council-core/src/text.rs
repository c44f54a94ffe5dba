//! Lexical text matching
//!
//! Cross-checking, claim agreement, and finding similarity all reduce to a few
//! string comparisons. They go through [`TextSimilarity`] so a stronger matcher
//! (edit distance, embeddings) can be dropped in without touching the pipeline
//! or consensus control flow.

use std::collections::HashSet;

/// Minimum word length (exclusive) counted by [`LexicalSimilarity::overlap`]
const MIN_WORD_LEN: usize = 3;

/// Text comparison primitives used by the verification and consensus engines
pub trait TextSimilarity {
    /// Normalize a free-text claim so equivalent claims compare equal
    fn normalize_claim(&self, claim: &str) -> String;

    /// Whether `haystack` mentions `needle`
    fn mentions(&self, haystack: &str, needle: &str) -> bool;

    /// Overlap between two texts in [0, 1]
    fn overlap(&self, a: &str, b: &str) -> f64;
}

/// Case-insensitive substring and word-set matching
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalSimilarity;

impl TextSimilarity for LexicalSimilarity {
    fn normalize_claim(&self, claim: &str) -> String {
        claim.trim().to_lowercase()
    }

    fn mentions(&self, haystack: &str, needle: &str) -> bool {
        let needle = needle.trim();
        if needle.is_empty() {
            return false;
        }
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }

    /// Jaccard index over case-folded words longer than three characters
    fn overlap(&self, a: &str, b: &str) -> f64 {
        let words_a = significant_words(a);
        let words_b = significant_words(b);

        let union = words_a.union(&words_b).count();
        if union == 0 {
            return 0.0;
        }
        let intersection = words_a.intersection(&words_b).count();
        intersection as f64 / union as f64
    }
}

fn significant_words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| w.chars().count() > MIN_WORD_LEN)
        .map(|w| w.to_lowercase())
        .collect()
}

/// Collapse every whitespace run to a single space and trim the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `n` characters of `text` (char-boundary safe)
pub fn prefix_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_claim() {
        let sim = LexicalSimilarity;
        assert_eq!(sim.normalize_claim("  Uses JWT Correctly "), "uses jwt correctly");
    }

    #[test]
    fn test_mentions_is_case_insensitive() {
        let sim = LexicalSimilarity;
        assert!(sim.mentions("SQL Injection in login handler", "sql injection"));
        assert!(!sim.mentions("SQL Injection", "xss"));
        assert!(!sim.mentions("anything", "   "));
    }

    #[test]
    fn test_overlap_identical_and_disjoint() {
        let sim = LexicalSimilarity;
        assert_eq!(sim.overlap("missing input validation", "Missing INPUT validation"), 1.0);
        assert_eq!(sim.overlap("unbounded cache growth", "token leaked logs"), 0.0);
    }

    #[test]
    fn test_overlap_ignores_short_words() {
        let sim = LexicalSimilarity;
        // "the", "in", "a" and "bug" are too short to count
        let score = sim.overlap("the loop in a handler", "loop handler bug");
        assert_eq!(score, 1.0);
        assert_eq!(sim.overlap("a an the", "of to in"), 0.0);
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  let   x =\t1;\n"), "let x = 1;");
    }

    #[test]
    fn test_prefix_chars() {
        assert_eq!(prefix_chars("abcdef", 3), "abc");
        assert_eq!(prefix_chars("ab", 3), "ab");
        assert_eq!(prefix_chars("héllo", 2), "hé");
    }
}
