//! Pairwise similarity between findings from different reviewers

use crate::finding::Finding;
use crate::text::{LexicalSimilarity, TextSimilarity};

const CATEGORY_WEIGHT: f64 = 0.3;
const SEVERITY_WEIGHT: f64 = 0.1;
const LOCATION_WEIGHT: f64 = 0.4;
const TEXT_WEIGHT: f64 = 0.2;

/// Maximum `line_start` distance still counted as "nearby"
const NEARBY_LINES: u32 = 5;

/// Scores how likely two findings describe the same issue
///
/// Clustering only ever compares a candidate against a cluster seed through
/// this trait, so the comparison can be swapped without touching clustering.
pub trait FindingSimilarity {
    /// Similarity in [0, 1]
    fn similarity(&self, a: &Finding, b: &Finding) -> f64;
}

/// Weighted blend of category, severity, location, and wording overlap
///
/// The location component only counts when both findings have a location;
/// otherwise it is left out of the normalizing weight as well, so findings
/// without locations are not penalized for it.
#[derive(Debug, Clone, Copy)]
pub struct WeightedSimilarity<T = LexicalSimilarity> {
    text: T,
}

impl WeightedSimilarity<LexicalSimilarity> {
    /// Create a scorer with lexical wording overlap
    pub fn new() -> Self {
        Self {
            text: LexicalSimilarity,
        }
    }
}

impl Default for WeightedSimilarity {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TextSimilarity> WeightedSimilarity<T> {
    /// Create a scorer using `text` for wording overlap
    pub fn with_text_similarity(text: T) -> Self {
        Self { text }
    }
}

impl<T: TextSimilarity> FindingSimilarity for WeightedSimilarity<T> {
    fn similarity(&self, a: &Finding, b: &Finding) -> f64 {
        let mut score = 0.0;
        let mut applicable = CATEGORY_WEIGHT + SEVERITY_WEIGHT + TEXT_WEIGHT;

        if a.category == b.category {
            score += CATEGORY_WEIGHT;
        }
        if a.severity == b.severity {
            score += SEVERITY_WEIGHT;
        }

        if let (Some(la), Some(lb)) = (&a.location, &b.location) {
            applicable += LOCATION_WEIGHT;
            if la.file == lb.file {
                score += LOCATION_WEIGHT / 2.0;
                if let (Some(sa), Some(sb)) = (la.line_start, lb.line_start) {
                    let distance = sa.abs_diff(sb);
                    if distance == 0 {
                        score += LOCATION_WEIGHT / 2.0;
                    } else if distance <= NEARBY_LINES {
                        score += LOCATION_WEIGHT / 4.0;
                    }
                }
            }
        }

        score += TEXT_WEIGHT * self.text.overlap(&a.text(), &b.text());

        score / applicable
    }
}
