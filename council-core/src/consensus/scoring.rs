//! Consensus scoring and filtering of clusters

use super::cluster::FindingCluster;
use crate::config::ConsensusConfig;
use crate::finding::{clamp_unit, Severity};

fn severity_weight(severity: Severity) -> f64 {
    match severity {
        Severity::Critical => 1.2,
        Severity::High => 1.1,
        Severity::Medium => 1.0,
        Severity::Low => 0.9,
        Severity::Info => 0.8,
    }
}

/// Agreement-weighted score in [0, 1] for a cluster
///
/// Starts from the representative's confidence. Clusters reported by more
/// than one reviewer are boosted in proportion to the share of participating
/// reviewers that agree, up to `agreement_boost` when all of them do.
pub fn consensus_score(cluster: &FindingCluster, total_models: usize, agreement_boost: f64) -> f64 {
    let representative = &cluster.representative;
    let mut score = representative.confidence;

    let sources = cluster.sources.len();
    if sources > 1 {
        let share = sources as f64 / total_models.max(sources) as f64;
        score *= 1.0 + (agreement_boost - 1.0) * share;
    }

    score *= severity_weight(representative.severity);
    clamp_unit(score)
}

/// Whether a scored cluster belongs in the council report
pub fn passes_filter(cluster: &FindingCluster, score: f64, config: &ConsensusConfig) -> bool {
    if score < config.min_consensus_threshold {
        return false;
    }
    if cluster.is_single_source() {
        return config.include_single_source_findings
            && cluster.representative.confidence >= config.single_source_min_confidence;
    }
    true
}
