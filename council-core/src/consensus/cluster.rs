//! Greedy clustering of findings across reviewers
//!
//! Findings are grouped by category first, which bounds the number of
//! comparisons. Within a category the next unclustered finding becomes a seed
//! and absorbs every remaining finding similar enough *to the seed*. Members
//! are never compared against each other, so a chain of pairwise-similar
//! findings can end up split across clusters; this keeps clustering to one
//! pass over the candidates per seed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::similarity::FindingSimilarity;
use crate::finding::{Category, Finding};

/// A finding tagged with the reviewer that reported it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedFinding {
    pub source: String,
    pub finding: Finding,
}

impl SourcedFinding {
    pub fn new(source: impl Into<String>, finding: Finding) -> Self {
        Self {
            source: source.into(),
            finding,
        }
    }
}

/// Findings judged to describe the same underlying issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingCluster {
    /// Highest-confidence member
    pub representative: Finding,
    /// Distinct reviewer ids, in the order they joined
    pub sources: Vec<String>,
    /// Every finding in the cluster, seed first
    pub members: Vec<SourcedFinding>,
}

impl FindingCluster {
    fn seeded(seed: &SourcedFinding) -> Self {
        Self {
            representative: seed.finding.clone(),
            sources: vec![seed.source.clone()],
            members: vec![seed.clone()],
        }
    }

    fn absorb(&mut self, member: &SourcedFinding) {
        if !self.sources.contains(&member.source) {
            self.sources.push(member.source.clone());
        }
        if member.finding.confidence > self.representative.confidence {
            self.representative = member.finding.clone();
        }
        self.members.push(member.clone());
    }

    /// Number of distinct reviewers that reported this issue
    pub fn agreement_count(&self) -> usize {
        self.sources.len()
    }

    /// Whether only one reviewer reported this issue
    pub fn is_single_source(&self) -> bool {
        self.sources.len() == 1
    }
}

/// Cluster findings whose similarity to a seed reaches `threshold`
///
/// Output is deterministic: categories come out in declaration order and
/// findings keep their input order within a category.
pub fn cluster_findings<S: FindingSimilarity + ?Sized>(
    findings: &[SourcedFinding],
    threshold: f64,
    similarity: &S,
) -> Vec<FindingCluster> {
    let mut by_category: BTreeMap<Category, Vec<&SourcedFinding>> = BTreeMap::new();
    for finding in findings {
        by_category
            .entry(finding.finding.category)
            .or_default()
            .push(finding);
    }

    let mut clusters = Vec::new();
    for group in by_category.values() {
        let mut clustered = vec![false; group.len()];

        for seed_idx in 0..group.len() {
            if clustered[seed_idx] {
                continue;
            }
            clustered[seed_idx] = true;

            let seed = group[seed_idx];
            let mut cluster = FindingCluster::seeded(seed);

            for candidate_idx in seed_idx + 1..group.len() {
                if clustered[candidate_idx] {
                    continue;
                }
                let candidate = group[candidate_idx];
                if similarity.similarity(&seed.finding, &candidate.finding) >= threshold {
                    clustered[candidate_idx] = true;
                    cluster.absorb(candidate);
                }
            }

            clusters.push(cluster);
        }
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::similarity::WeightedSimilarity;
    use crate::finding::{Location, Severity};

    fn auth_finding(id: &str, confidence: f64) -> Finding {
        Finding::new(
            id,
            Category::Security,
            Severity::High,
            confidence,
            "Missing rate limit on login",
            "Brute force attempts are not throttled",
        )
        .at(Location::line("auth.ts", 42))
    }

    #[test]
    fn test_merges_same_issue_from_two_reviewers() {
        let findings = vec![
            SourcedFinding::new("claude", auth_finding("c1", 0.9)),
            SourcedFinding::new("gemini", auth_finding("g1", 0.8)),
        ];
        let clusters = cluster_findings(&findings, 0.6, &WeightedSimilarity::new());

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].sources, vec!["claude", "gemini"]);
        assert_eq!(clusters[0].representative.id, "c1");
        assert_eq!(clusters[0].representative.confidence, 0.9);
    }

    #[test]
    fn test_representative_follows_highest_confidence() {
        let findings = vec![
            SourcedFinding::new("gemini", auth_finding("g1", 0.8)),
            SourcedFinding::new("claude", auth_finding("c1", 0.9)),
            SourcedFinding::new("codex", auth_finding("x1", 0.85)),
        ];
        let clusters = cluster_findings(&findings, 0.6, &WeightedSimilarity::new());

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].representative.id, "c1");
        assert_eq!(clusters[0].agreement_count(), 3);
    }

    #[test]
    fn test_sources_are_distinct() {
        let findings = vec![
            SourcedFinding::new("claude", auth_finding("c1", 0.9)),
            SourcedFinding::new("claude", auth_finding("c2", 0.7)),
            SourcedFinding::new("gemini", auth_finding("g1", 0.8)),
        ];
        let clusters = cluster_findings(&findings, 0.6, &WeightedSimilarity::new());

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].sources, vec!["claude", "gemini"]);
        assert_eq!(clusters[0].members.len(), 3);
    }

    #[test]
    fn test_categories_never_mix() {
        let mut other = auth_finding("g1", 0.8);
        other.category = Category::Performance;
        let findings = vec![
            SourcedFinding::new("claude", auth_finding("c1", 0.9)),
            SourcedFinding::new("gemini", other),
        ];
        let clusters = cluster_findings(&findings, 0.0, &WeightedSimilarity::new());

        assert_eq!(clusters.len(), 2);
        for cluster in &clusters {
            assert!(cluster
                .members
                .iter()
                .all(|m| m.finding.category == cluster.representative.category));
        }
    }

    #[test]
    fn test_dissimilar_findings_stay_apart() {
        let unrelated = Finding::new(
            "g1",
            Category::Security,
            Severity::Low,
            0.8,
            "Verbose error pages",
            "Stack traces shown to users",
        )
        .at(Location::line("server.ts", 7));
        let findings = vec![
            SourcedFinding::new("claude", auth_finding("c1", 0.9)),
            SourcedFinding::new("gemini", unrelated),
        ];
        let clusters = cluster_findings(&findings, 0.6, &WeightedSimilarity::new());

        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(FindingCluster::is_single_source));
    }

    #[test]
    fn test_clustering_is_repeatable() {
        let findings: Vec<_> = (0..6)
            .map(|i| {
                let mut f = auth_finding(&format!("f{}", i), 0.5 + i as f64 / 20.0);
                f.location = Some(Location::line("auth.ts", 10 * i));
                SourcedFinding::new("claude", f)
            })
            .collect();
        let similarity = WeightedSimilarity::new();

        let first = cluster_findings(&findings, 0.6, &similarity);
        let second = cluster_findings(&findings, 0.6, &similarity);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input() {
        let clusters = cluster_findings(&[], 0.6, &WeightedSimilarity::new());
        assert!(clusters.is_empty());
    }
}
