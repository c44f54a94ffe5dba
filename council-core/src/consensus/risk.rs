//! Merging risk assessments from several reviewers

use std::collections::HashSet;

use crate::finding::RiskAssessment;

/// Concerns kept in the combined assessment
const MAX_CONCERNS: usize = 5;

/// Combine reviewer risk assessments into one
///
/// The score is the rounded mean, the level is the most severe level any
/// reviewer reported, concerns are the first five distinct ones, and
/// mitigations are the union. With no assessments this returns a minimal,
/// zero-score assessment.
pub fn combine_risk<'a>(assessments: impl IntoIterator<Item = &'a RiskAssessment>) -> RiskAssessment {
    let mut combined = RiskAssessment::default();
    let mut count = 0usize;
    let mut total = 0.0;
    let mut seen_concerns = HashSet::new();
    let mut seen_mitigations = HashSet::new();

    for assessment in assessments {
        count += 1;
        total += assessment.score;
        combined.level = combined.level.max(assessment.level);

        for concern in &assessment.concerns {
            if combined.concerns.len() < MAX_CONCERNS && seen_concerns.insert(dedup_key(concern)) {
                combined.concerns.push(concern.trim().to_string());
            }
        }
        for mitigation in &assessment.mitigations {
            if seen_mitigations.insert(dedup_key(mitigation)) {
                combined.mitigations.push(mitigation.trim().to_string());
            }
        }
    }

    if count > 0 {
        combined.score = (total / count as f64).round();
    }
    combined
}

fn dedup_key(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::RiskLevel;

    fn risk(score: f64, level: RiskLevel, concerns: &[&str], mitigations: &[&str]) -> RiskAssessment {
        RiskAssessment {
            score,
            level,
            concerns: concerns.iter().map(|s| s.to_string()).collect(),
            mitigations: mitigations.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_combine_two() {
        let a = risk(6.0, RiskLevel::Medium, &["Auth bypass"], &["Add tests"]);
        let b = risk(9.0, RiskLevel::High, &["auth bypass ", "Data loss"], &["Add tests", "Backups"]);
        let combined = combine_risk([&a, &b]);

        assert_eq!(combined.score, 8.0);
        assert_eq!(combined.level, RiskLevel::High);
        assert_eq!(combined.concerns, vec!["Auth bypass", "Data loss"]);
        assert_eq!(combined.mitigations, vec!["Add tests", "Backups"]);
    }

    #[test]
    fn test_concerns_capped() {
        let a = risk(1.0, RiskLevel::Low, &["a", "b", "c", "d"], &[]);
        let b = risk(1.0, RiskLevel::Minimal, &["e", "f", "g"], &[]);
        let combined = combine_risk([&a, &b]);

        assert_eq!(combined.concerns, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(combined.level, RiskLevel::Low);
    }

    #[test]
    fn test_empty_fallback() {
        let combined = combine_risk(std::iter::empty());
        assert_eq!(combined, RiskAssessment::default());
        assert_eq!(combined.level, RiskLevel::Minimal);
    }
}
