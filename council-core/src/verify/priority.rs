//! Priority scoring and action selection for verified findings

use serde::{Deserialize, Serialize};
use std::fmt;

use super::verifier::VerifiedFinding;
use crate::finding::Severity;

/// What to do about a verified finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    /// Fix immediately
    FixNow,
    /// Plausible but needs a human to confirm
    Investigate,
    /// Real but not urgent
    Defer,
    /// Not credible enough to act on
    Reject,
}

impl RecommendedAction {
    /// Get the wire name for this action
    pub fn name(&self) -> &'static str {
        match self {
            RecommendedAction::FixNow => "fix_now",
            RecommendedAction::Investigate => "investigate",
            RecommendedAction::Defer => "defer",
            RecommendedAction::Reject => "reject",
        }
    }
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A verified finding with its priority and recommended action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub finding: VerifiedFinding,
    pub action: RecommendedAction,
    /// Priority in [0, 100]
    pub priority: f64,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
}

fn severity_score(severity: Severity) -> f64 {
    match severity {
        Severity::Critical => 100.0,
        Severity::High => 75.0,
        Severity::Medium => 50.0,
        Severity::Low => 25.0,
        Severity::Info => 10.0,
    }
}

/// Compute a priority in [0, 100]
///
/// Blends severity (40%) with adjusted confidence (60%), then scales by
/// whether the finding has a location, a suggestion, matching evidence, and
/// whether the prior analysis already addressed it.
pub fn priority(verified: &VerifiedFinding) -> f64 {
    let finding = &verified.finding;
    let base = severity_score(finding.severity) * 0.4 + verified.adjusted_confidence * 100.0 * 0.6;

    let location_mod = if finding.location.is_some() { 1.1 } else { 0.9 };
    let suggestion_mod = if finding.suggestion.is_some() { 1.1 } else { 1.0 };
    let match_mod = if verified.verification.code_snippet_matches == Some(true) {
        1.2
    } else {
        1.0
    };
    let addressed_mod = if verified.cross_check.already_addressed_by_cc {
        0.3
    } else {
        1.0
    };

    let score = base * location_mod * suggestion_mod * match_mod * addressed_mod;
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

/// Pick an action for a finding; the first matching rule wins
pub fn decide_action(verified: &VerifiedFinding, priority: f64) -> (RecommendedAction, &'static str) {
    let verification = &verified.verification;

    if !verification.file_exists {
        return (
            RecommendedAction::Reject,
            "Referenced file does not exist in the working directory",
        );
    }
    if !verification.line_valid {
        return (
            RecommendedAction::Reject,
            "Referenced line is past the end of the file",
        );
    }
    if verification.code_snippet_matches == Some(false) {
        return (
            RecommendedAction::Investigate,
            "Quoted evidence does not match the code at the referenced location",
        );
    }
    if verified.cross_check.already_addressed_by_cc {
        return (
            RecommendedAction::Reject,
            "Already addressed in the prior analysis",
        );
    }
    if verified.adjusted_confidence < 0.3 {
        return (
            RecommendedAction::Defer,
            "Confidence too low after verification",
        );
    }
    if verified.finding.severity == Severity::Critical && priority > 70.0 {
        return (
            RecommendedAction::FixNow,
            "Critical severity with verified high priority",
        );
    }
    if priority > 60.0 {
        return (RecommendedAction::FixNow, "High priority finding");
    }
    if priority > 40.0 {
        return (
            RecommendedAction::Investigate,
            "Moderate priority, worth investigating",
        );
    }
    (RecommendedAction::Defer, "Low priority, can be deferred")
}

/// Turn a verified finding into an action item
pub fn prioritize(verified: VerifiedFinding) -> ActionItem {
    let priority = priority(&verified);
    let (action, reason) = decide_action(&verified, priority);
    let suggested_fix = verified.finding.suggestion.clone();

    ActionItem {
        finding: verified,
        action,
        priority,
        reason: reason.to_string(),
        suggested_fix,
    }
}
