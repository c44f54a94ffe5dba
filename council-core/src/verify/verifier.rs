//! Filesystem-level verification of a single finding
//!
//! Checks are applied in a fixed order and each one scales the reviewer's
//! confidence:
//!
//! | check                          | multiplier |
//! |--------------------------------|------------|
//! | path escapes the working root  | 0.05       |
//! | file missing                   | 0.1        |
//! | `line_start` past end of file  | 0.3        |
//! | evidence matches the code      | 1.2 (capped at 1.0) |
//! | evidence does not match        | 0.5        |
//!
//! Read failures are recorded as notes and leave the affected check unknown;
//! they never abort verification.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::cache::FileCache;
use crate::finding::{clamp_unit, Finding, Location};
use crate::text::{normalize_whitespace, prefix_chars};

const TRAVERSAL_PENALTY: f64 = 0.05;
const MISSING_FILE_PENALTY: f64 = 0.1;
const LINE_OUT_OF_RANGE_PENALTY: f64 = 0.3;
const EVIDENCE_MATCH_BOOST: f64 = 1.2;
const EVIDENCE_MISMATCH_PENALTY: f64 = 0.5;

/// Characters of normalized evidence compared against the source
const EVIDENCE_PREFIX_CHARS: usize = 50;

/// Outcome of checking a finding against the working tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub file_exists: bool,
    pub line_valid: bool,
    /// `None` when there was no evidence to compare or the file was unreadable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet_matches: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_notes: Vec<String>,
}

impl Verification {
    /// Nothing could be falsified
    fn unfalsified() -> Self {
        Self {
            file_exists: true,
            line_valid: true,
            code_snippet_matches: None,
            verification_notes: Vec::new(),
        }
    }

    fn note(&mut self, note: impl Into<String>) {
        self.verification_notes.push(note.into());
    }
}

/// Relationship between a finding and a prior analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossCheck {
    /// The prior analysis already covers this and marked it addressed
    #[serde(rename = "alreadyAddressedByCC")]
    pub already_addressed_by_cc: bool,
    /// The finding claims a prior assumption is incorrect
    #[serde(rename = "conflictsWithCC")]
    pub conflicts_with_cc: bool,
    /// The prior analysis mentions this finding
    #[serde(rename = "ccMentioned")]
    pub cc_mentioned: bool,
}

/// A finding together with its verification and cross-check results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedFinding {
    #[serde(flatten)]
    pub finding: Finding,
    pub verification: Verification,
    pub cross_check: CrossCheck,
    /// Reviewer confidence after verification, in [0, 1]
    pub adjusted_confidence: f64,
}

/// Verify one finding using a shared cache
pub fn verify_finding(finding: &Finding, cache: &mut FileCache) -> VerifiedFinding {
    let mut verification = Verification::unfalsified();
    let mut confidence = clamp_unit(finding.confidence);

    if let Some(location) = &finding.location {
        confidence *= check_location(finding, location, cache, &mut verification);
    }

    VerifiedFinding {
        finding: finding.clone(),
        verification,
        cross_check: CrossCheck::default(),
        adjusted_confidence: clamp_unit(confidence),
    }
}

/// Verify one finding against `workdir` with a throwaway cache
pub fn verify_finding_in(finding: &Finding, workdir: impl AsRef<Path>) -> VerifiedFinding {
    let mut cache = FileCache::new(workdir);
    verify_finding(finding, &mut cache)
}

/// Run the location checks and return the confidence multiplier they earned
fn check_location(
    finding: &Finding,
    location: &Location,
    cache: &mut FileCache,
    verification: &mut Verification,
) -> f64 {
    if cache.resolve(&location.file).is_none() {
        warn!(
            finding = %finding.id,
            file = %location.file,
            "Blocked finding path outside working directory"
        );
        verification.file_exists = false;
        verification.line_valid = false;
        verification.note(format!(
            "Path traversal blocked: {} resolves outside the working directory",
            location.file
        ));
        return TRAVERSAL_PENALTY;
    }

    if !cache.exists(&location.file) {
        verification.file_exists = false;
        verification.line_valid = false;
        verification.note(format!("File not found: {}", location.file));
        return MISSING_FILE_PENALTY;
    }

    let Some(line_start) = location.line_start else {
        return 1.0;
    };

    let lines = match cache.lines(&location.file) {
        Ok(Some(lines)) => lines,
        Ok(None) => {
            verification.note(format!("{} disappeared during verification", location.file));
            return 1.0;
        }
        Err(e) => {
            verification.note(format!("Could not read {}: {}", location.file, e));
            return 1.0;
        }
    };

    let start = line_start as usize;
    if start == 0 || start > lines.len() {
        verification.line_valid = false;
        verification.note(format!(
            "Line {} exceeds file length ({} lines)",
            line_start,
            lines.len()
        ));
        return LINE_OUT_OF_RANGE_PENALTY;
    }

    let Some(evidence) = finding.evidence.as_deref() else {
        return 1.0;
    };

    let end = location
        .line_end
        .map(|end| (end as usize).clamp(start, lines.len()))
        .unwrap_or(start);
    let actual = lines[start - 1..end].join("\n");

    match evidence_matches(evidence, &actual) {
        Some(true) => {
            verification.code_snippet_matches = Some(true);
            EVIDENCE_MATCH_BOOST
        }
        Some(false) => {
            verification.code_snippet_matches = Some(false);
            verification.note(format!(
                "Evidence does not match code at {}",
                Location {
                    file: location.file.clone(),
                    line_start: Some(line_start),
                    line_end: Some(end as u32),
                }
            ));
            EVIDENCE_MISMATCH_PENALTY
        }
        None => 1.0,
    }
}

/// Compare quoted evidence with actual source, ignoring whitespace layout
///
/// Either side may contain the first 50 normalized characters of the other,
/// so a blank source line matches any evidence. Returns `None` when the
/// evidence is blank.
pub fn evidence_matches(evidence: &str, actual: &str) -> Option<bool> {
    let evidence = normalize_whitespace(evidence);
    if evidence.is_empty() {
        return None;
    }
    let actual = normalize_whitespace(actual);

    Some(
        actual.contains(prefix_chars(&evidence, EVIDENCE_PREFIX_CHARS))
            || evidence.contains(prefix_chars(&actual, EVIDENCE_PREFIX_CHARS)),
    )
}
