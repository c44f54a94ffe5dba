//! Per-reviewer verification pipeline
//!
//! Runs verification, cross-checking, and prioritization over every finding a
//! single reviewer produced, sharing one [`FileCache`] for the run. Each
//! finding is processed independently: a problem with one never affects its
//! siblings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::cache::FileCache;
use super::cross_check::{cross_check, PriorAnalysis};
use super::priority::{prioritize, ActionItem, RecommendedAction};
use super::verifier::{verify_finding, VerifiedFinding};
use crate::finding::Finding;
use crate::text::{LexicalSimilarity, TextSimilarity};

/// A finding the pipeline decided not to act on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedFinding {
    pub finding: Finding,
    pub reason: String,
}

/// Counts for a processed review
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub total: usize,
    pub verified: usize,
    pub rejected: usize,
    pub fix_now: usize,
    pub investigate: usize,
    pub defer: usize,
    /// Every `fix_now` item, highest priority first
    pub top_priority: Vec<ActionItem>,
}

/// Result of running one reviewer's findings through the pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedReview {
    /// Findings that survived verification
    pub verified: Vec<VerifiedFinding>,
    pub rejected: Vec<RejectedFinding>,
    /// Accepted findings, highest priority first
    pub action_plan: Vec<ActionItem>,
    pub summary: ReviewSummary,
}

/// Verification pipeline bound to one working directory
#[derive(Debug, Clone)]
pub struct ReviewPipeline<T = LexicalSimilarity> {
    workdir: PathBuf,
    prior: Option<PriorAnalysis>,
    text: T,
}

impl ReviewPipeline<LexicalSimilarity> {
    /// Create a pipeline for `workdir` with lexical matching
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            prior: None,
            text: LexicalSimilarity,
        }
    }
}

impl<T: TextSimilarity> ReviewPipeline<T> {
    /// Cross-check findings against a prior analysis
    pub fn with_prior(mut self, prior: PriorAnalysis) -> Self {
        self.prior = Some(prior);
        self
    }

    /// Swap the text matcher used for cross-checking
    pub fn with_text_similarity<U: TextSimilarity>(self, text: U) -> ReviewPipeline<U> {
        ReviewPipeline {
            workdir: self.workdir,
            prior: self.prior,
            text,
        }
    }

    /// Process one reviewer's findings
    ///
    /// A fresh [`FileCache`] is created for every call, so results always
    /// reflect the working tree as it is now.
    pub fn process(&self, findings: &[Finding]) -> ProcessedReview {
        let mut cache = FileCache::new(&self.workdir);
        let empty = PriorAnalysis::default();
        let prior = self.prior.as_ref().unwrap_or(&empty);

        let mut review = ProcessedReview::default();
        for finding in findings {
            let verified = verify_finding(finding, &mut cache);
            let verified = cross_check(verified, prior, &self.text);
            let item = prioritize(verified);

            debug!(
                finding = %finding.id,
                action = %item.action,
                priority = item.priority,
                "Prioritized finding"
            );

            if item.action == RecommendedAction::Reject {
                review.rejected.push(RejectedFinding {
                    finding: item.finding.finding,
                    reason: item.reason,
                });
            } else {
                review.verified.push(item.finding.clone());
                review.action_plan.push(item);
            }
        }

        review
            .action_plan
            .sort_by(|a, b| b.priority.total_cmp(&a.priority));
        review.summary = summarize(findings.len(), &review);

        let stats = cache.stats();
        info!(
            total = review.summary.total,
            rejected = review.summary.rejected,
            fix_now = review.summary.fix_now,
            files_checked = stats.files_checked,
            files_loaded = stats.files_loaded,
            "Processed review"
        );

        review
    }
}

fn summarize(total: usize, review: &ProcessedReview) -> ReviewSummary {
    let count = |action: RecommendedAction| {
        review
            .action_plan
            .iter()
            .filter(|item| item.action == action)
            .count()
    };

    ReviewSummary {
        total,
        verified: review.verified.len(),
        rejected: review.rejected.len(),
        fix_now: count(RecommendedAction::FixNow),
        investigate: count(RecommendedAction::Investigate),
        defer: count(RecommendedAction::Defer),
        top_priority: review
            .action_plan
            .iter()
            .filter(|item| item.action == RecommendedAction::FixNow)
            .cloned()
            .collect(),
    }
}

/// Process one reviewer's findings against `workdir`
///
/// Shorthand for building a [`ReviewPipeline`] with lexical matching.
pub fn process_review(
    findings: &[Finding],
    workdir: impl Into<PathBuf>,
    prior: Option<PriorAnalysis>,
) -> ProcessedReview {
    let mut pipeline = ReviewPipeline::new(workdir);
    if let Some(prior) = prior {
        pipeline = pipeline.with_prior(prior);
    }
    pipeline.process(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::{Category, Location, Severity};
    use crate::verify::cross_check::PriorFinding;
    use std::fs;
    use tempfile::TempDir;

    fn workdir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/db.rs"),
            "fn query(sql: &str) {\n    conn.execute(&format!(\"SELECT * FROM users WHERE id = {}\", sql));\n}\n",
        )
        .unwrap();
        dir
    }

    fn findings() -> Vec<Finding> {
        vec![
            Finding::new(
                "sqli",
                Category::Security,
                Severity::Critical,
                0.9,
                "SQL injection in query",
                "User input is formatted straight into SQL",
            )
            .at(Location::line("src/db.rs", 2))
            .with_evidence("conn.execute(&format!(\"SELECT * FROM users WHERE id = {}\", sql));")
            .with_suggestion("Use bound parameters"),
            Finding::new(
                "ghost",
                Category::Correctness,
                Severity::High,
                0.9,
                "Panic in missing module",
                "Unwrap on None",
            )
            .at(Location::line("src/ghost.rs", 3)),
            Finding::new(
                "naming",
                Category::Maintainability,
                Severity::Low,
                0.5,
                "Vague function name",
                "query does not say what it queries",
            ),
            Finding::new(
                "wrong-evidence",
                Category::Correctness,
                Severity::Medium,
                0.8,
                "Missing semicolon",
                "Statement is not terminated",
            )
            .at(Location::line("src/db.rs", 1))
            .with_evidence("let x = 5"),
        ]
    }

    #[test]
    fn test_process_partitions_and_sorts() {
        let dir = workdir();
        let review = process_review(&findings(), dir.path(), None);

        assert_eq!(review.summary.total, 4);
        assert_eq!(review.rejected.len(), 1);
        assert_eq!(review.rejected[0].finding.id, "ghost");
        assert_eq!(review.verified.len(), 3);
        assert_eq!(review.action_plan.len(), 3);

        assert_eq!(review.action_plan[0].finding.finding.id, "sqli");
        assert_eq!(review.action_plan[0].action, RecommendedAction::FixNow);
        assert!(review
            .action_plan
            .windows(2)
            .all(|w| w[0].priority >= w[1].priority));

        assert_eq!(review.summary.fix_now, 1);
        assert_eq!(review.summary.top_priority.len(), 1);
        assert_eq!(review.summary.top_priority[0].finding.finding.id, "sqli");
    }

    #[test]
    fn test_evidence_mismatch_goes_to_investigate() {
        let dir = workdir();
        let review = process_review(&findings(), dir.path(), None);

        let item = review
            .action_plan
            .iter()
            .find(|i| i.finding.finding.id == "wrong-evidence")
            .unwrap();
        assert_eq!(item.action, RecommendedAction::Investigate);
        assert_eq!(review.summary.investigate, 1);
    }

    #[test]
    fn test_invariants_hold() {
        let dir = workdir();
        let review = process_review(&findings(), dir.path(), None);

        for item in &review.action_plan {
            assert!((0.0..=100.0).contains(&item.priority));
            assert!((0.0..=1.0).contains(&item.finding.adjusted_confidence));
            if !item.finding.verification.file_exists {
                assert_eq!(item.action, RecommendedAction::Reject);
            }
        }
    }

    #[test]
    fn test_prior_addressed_rejects() {
        let dir = workdir();
        let prior = PriorAnalysis {
            findings: vec![PriorFinding::new("SQL injection in query was patched").addressed()],
            assumptions: Vec::new(),
        };
        let review = process_review(&findings(), dir.path(), Some(prior));

        assert!(review.rejected.iter().any(|r| r.finding.id == "sqli"));
        assert_eq!(review.summary.fix_now, 0);
    }

    #[test]
    fn test_unreadable_file_does_not_affect_siblings() {
        let dir = workdir();
        fs::write(dir.path().join("src/blob.bin"), [0xc3, 0x28, 0xa0, 0xa1]).unwrap();
        let mut findings = findings();
        findings.truncate(1);
        findings.push(
            Finding::new(
                "blob",
                Category::Correctness,
                Severity::Medium,
                0.8,
                "Corrupt fixture",
                "Fixture bytes are not valid UTF-8",
            )
            .at(Location::line("src/blob.bin", 1))
            .with_evidence("fixture"),
        );

        let review = process_review(&findings, dir.path(), None);

        assert!(review.rejected.is_empty());
        assert_eq!(review.verified.len(), 2);
        let blob = review
            .verified
            .iter()
            .find(|v| v.finding.id == "blob")
            .unwrap();
        assert_eq!(blob.verification.code_snippet_matches, None);
        assert_eq!(blob.adjusted_confidence, 0.8);
        assert!(blob
            .verification
            .verification_notes
            .iter()
            .any(|n| n.contains("Could not read")));

        let sqli = review
            .verified
            .iter()
            .find(|v| v.finding.id == "sqli")
            .unwrap();
        assert_eq!(sqli.verification.code_snippet_matches, Some(true));
    }

    #[test]
    fn test_deterministic() {
        let dir = workdir();
        let pipeline = ReviewPipeline::new(dir.path());
        let first = pipeline.process(&findings());
        let second = pipeline.process(&findings());
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_review() {
        let dir = workdir();
        let review = process_review(&[], dir.path(), None);
        assert_eq!(review.summary.total, 0);
        assert!(review.action_plan.is_empty());
    }

    #[test]
    fn test_serialized_field_names() {
        let dir = workdir();
        let review = process_review(&findings()[..1], dir.path(), None);
        let json = serde_json::to_value(&review).unwrap();

        assert!(json.get("actionPlan").is_some());
        let item = &json["actionPlan"][0];
        assert_eq!(item["action"], "fix_now");
        assert_eq!(item["finding"]["verification"]["fileExists"], true);
        assert_eq!(item["finding"]["crossCheck"]["alreadyAddressedByCC"], false);
        assert_eq!(item["finding"]["id"], "sqli");
    }
}
