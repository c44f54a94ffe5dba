//! Cross-checking findings against a prior analysis
//!
//! A prior analysis is whatever was already known before this review ran:
//! free-text findings (some marked as already addressed) and the assumptions
//! that analysis made. Matching is lexical and goes through
//! [`TextSimilarity`].

use serde::{Deserialize, Serialize};

use super::paths::location_file;
use super::verifier::VerifiedFinding;
use crate::text::{prefix_chars, TextSimilarity};

/// Characters of a finding's title looked up in prior descriptions
const TITLE_PREFIX_CHARS: usize = 30;

/// Characters of a prior assumption looked up in a finding's text
const ASSUMPTION_PREFIX_CHARS: usize = 20;

/// Marker a finding uses when it contradicts an assumption
const CONFLICT_MARKER: &str = "incorrect";

/// A finding from the prior analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorFinding {
    pub description: String,
    /// Free-form location such as `src/auth.ts:42`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub addressed: bool,
}

impl PriorFinding {
    /// Create an unaddressed prior finding
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            location: None,
            addressed: false,
        }
    }

    /// Set the location string
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Mark as already addressed
    pub fn addressed(mut self) -> Self {
        self.addressed = true;
        self
    }
}

/// Record of an earlier analysis of the same codebase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorAnalysis {
    #[serde(default)]
    pub findings: Vec<PriorFinding>,
    #[serde(default)]
    pub assumptions: Vec<String>,
}

/// Populate `cross_check` on a verified finding
pub fn cross_check<T: TextSimilarity + ?Sized>(
    mut verified: VerifiedFinding,
    prior: &PriorAnalysis,
    text: &T,
) -> VerifiedFinding {
    let finding = &verified.finding;
    let title_prefix = prefix_chars(&finding.title, TITLE_PREFIX_CHARS);
    let file = finding.location.as_ref().map(|l| location_file(&l.file));

    for candidate in &prior.findings {
        let same_file = match (file, candidate.location.as_deref()) {
            (Some(ours), Some(theirs)) => !ours.is_empty() && ours == location_file(theirs),
            _ => false,
        };

        if text.mentions(&candidate.description, title_prefix) || same_file {
            verified.cross_check.cc_mentioned = true;
            if candidate.addressed {
                verified.cross_check.already_addressed_by_cc = true;
                break;
            }
        }
    }

    let body = finding.text();
    verified.cross_check.conflicts_with_cc = text.mentions(&body, CONFLICT_MARKER)
        && prior
            .assumptions
            .iter()
            .any(|a| text.mentions(&body, prefix_chars(a.trim(), ASSUMPTION_PREFIX_CHARS)));

    verified
}
