//! Synthesis of several reviewer outputs into one council report

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::cluster::{cluster_findings, FindingCluster, SourcedFinding};
use super::risk::combine_risk;
use super::scoring::{consensus_score, passes_filter};
use super::similarity::{FindingSimilarity, WeightedSimilarity};
use crate::config::ConsensusConfig;
use crate::finding::{Finding, ReviewerOutput, RiskAssessment};
use crate::text::{LexicalSimilarity, TextSimilarity};
use crate::{Error, Result};

/// Raw confidence a single-source finding needs to count as a unique insight
const UNIQUE_INSIGHT_MIN_CONFIDENCE: f64 = 0.6;

const SUPPORTS: &str = "Supports this claim";
const DISPUTES: &str = "Disputes this claim";

/// Whether other reviewers corroborated a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerValidation {
    /// Reported by more than one reviewer
    Validated,
    /// Reported by a single reviewer
    Unreviewed,
}

/// A clustered finding with its agreement metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusFinding {
    #[serde(flatten)]
    pub finding: Finding,
    pub consensus_score: f64,
    pub agreement_count: usize,
    pub sources: Vec<String>,
    pub peer_validation: PeerValidation,
}

impl ConsensusFinding {
    fn from_cluster(cluster: &FindingCluster, consensus_score: f64) -> Self {
        let peer_validation = if cluster.sources.len() > 1 {
            PeerValidation::Validated
        } else {
            PeerValidation::Unreviewed
        };

        Self {
            finding: cluster.representative.clone(),
            consensus_score,
            agreement_count: cluster.sources.len(),
            sources: cluster.sources.clone(),
            peer_validation,
        }
    }
}

/// A claim that reviewers took opposite positions on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConflict {
    /// Normalized claim text
    pub topic: String,
    /// Reviewer id to stance
    pub positions: BTreeMap<String, String>,
}

/// The synthesized multi-reviewer report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouncilReviewOutput {
    pub individual_reviews: BTreeMap<String, ReviewerOutput>,
    /// Highest consensus score first
    pub consensus_findings: Vec<ConsensusFinding>,
    pub unanimous_agreements: Vec<String>,
    pub conflicts: Vec<ModelConflict>,
    pub unique_insights: BTreeMap<String, Vec<String>>,
    pub combined_risk: RiskAssessment,
    pub models_participated: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models_failed: Option<Vec<String>>,
}

/// Builds council reports from reviewer outputs
#[derive(Debug, Clone)]
pub struct Synthesizer<S = WeightedSimilarity, T = LexicalSimilarity> {
    config: ConsensusConfig,
    similarity: S,
    text: T,
}

impl Synthesizer {
    /// Create a synthesizer with the default similarity and text matching
    pub fn new(config: ConsensusConfig) -> Self {
        Self {
            config,
            similarity: WeightedSimilarity::new(),
            text: LexicalSimilarity,
        }
    }
}

impl<S: FindingSimilarity, T: TextSimilarity> Synthesizer<S, T> {
    /// Swap the finding comparison used for clustering
    pub fn with_finding_similarity<U: FindingSimilarity>(self, similarity: U) -> Synthesizer<U, T> {
        Synthesizer {
            config: self.config,
            similarity,
            text: self.text,
        }
    }

    /// Swap the text matcher used for claims and disputes
    pub fn with_text_similarity<U: TextSimilarity>(self, text: U) -> Synthesizer<S, U> {
        Synthesizer {
            config: self.config,
            similarity: self.similarity,
            text,
        }
    }

    /// Synthesize a council report
    ///
    /// `outputs` are the reviewers that answered; `failed` lists the ones
    /// that did not and only ends up in `models_failed`. Callers must supply
    /// at least one output, otherwise [`Error::NoReviewers`] is returned.
    /// Duplicate reviewer ids keep the first output.
    pub fn synthesize(
        &self,
        outputs: Vec<ReviewerOutput>,
        failed: Vec<String>,
    ) -> Result<CouncilReviewOutput> {
        let mut seen = HashSet::new();
        let outputs: Vec<ReviewerOutput> = outputs
            .into_iter()
            .filter(|o| {
                let fresh = seen.insert(o.reviewer.clone());
                if !fresh {
                    warn!(reviewer = %o.reviewer, "Ignoring duplicate reviewer output");
                }
                fresh
            })
            .collect();

        if outputs.is_empty() {
            return Err(Error::NoReviewers);
        }

        let sourced: Vec<SourcedFinding> = outputs
            .iter()
            .flat_map(|o| {
                o.findings
                    .iter()
                    .map(move |f| SourcedFinding::new(o.reviewer.clone(), f.clone()))
            })
            .collect();

        let clusters = cluster_findings(&sourced, self.config.similarity_threshold, &self.similarity);
        debug!(
            findings = sourced.len(),
            clusters = clusters.len(),
            "Clustered findings"
        );

        let consensus_findings = self.score_clusters(&clusters, &outputs);
        let unanimous_agreements = self.unanimous_agreements(&outputs);
        let conflicts = self.conflicts(&outputs);
        let unique_insights = unique_insights(&clusters);
        let combined_risk = combine_risk(outputs.iter().filter_map(|o| o.risk_assessment.as_ref()));

        let models_participated: Vec<String> = outputs.iter().map(|o| o.reviewer.clone()).collect();
        let models_failed = (!failed.is_empty()).then_some(failed);

        info!(
            participated = models_participated.len(),
            failed = models_failed.as_ref().map_or(0, Vec::len),
            consensus = consensus_findings.len(),
            conflicts = conflicts.len(),
            "Synthesized council review"
        );

        Ok(CouncilReviewOutput {
            individual_reviews: outputs
                .into_iter()
                .map(|o| (o.reviewer.clone(), o))
                .collect(),
            consensus_findings,
            unanimous_agreements,
            conflicts,
            unique_insights,
            combined_risk,
            models_participated,
            models_failed,
        })
    }

    fn score_clusters(
        &self,
        clusters: &[FindingCluster],
        outputs: &[ReviewerOutput],
    ) -> Vec<ConsensusFinding> {
        let total_models = outputs.len();
        let mut findings: Vec<ConsensusFinding> = clusters
            .iter()
            .filter_map(|cluster| {
                let mut score =
                    consensus_score(cluster, total_models, self.config.agreement_boost);
                if self.is_disputed(&cluster.representative, outputs) {
                    debug!(title = %cluster.representative.title, "Finding disputed by a reviewer");
                    score *= self.config.dispute_penalty;
                }
                passes_filter(cluster, score, &self.config)
                    .then(|| ConsensusFinding::from_cluster(cluster, score))
            })
            .collect();

        findings.sort_by(|a, b| b.consensus_score.total_cmp(&a.consensus_score));
        findings
    }

    fn is_disputed(&self, finding: &Finding, outputs: &[ReviewerOutput]) -> bool {
        let title = self.text.normalize_claim(&finding.title);
        outputs
            .iter()
            .flat_map(|o| &o.disagreements)
            .any(|claim| self.text.mentions(claim, &title))
    }

    /// Claims every reviewer endorses; needs at least two reviewers
    fn unanimous_agreements(&self, outputs: &[ReviewerOutput]) -> Vec<String> {
        if outputs.len() < 2 {
            return Vec::new();
        }

        let per_reviewer: Vec<HashSet<String>> = outputs
            .iter()
            .map(|o| {
                o.agreements
                    .iter()
                    .map(|a| self.text.normalize_claim(a))
                    .filter(|claim| !claim.is_empty())
                    .collect()
            })
            .collect();

        let mut unanimous = Vec::new();
        for claim in &per_reviewer[0] {
            if per_reviewer[1..].iter().all(|set| set.contains(claim)) {
                unanimous.push(claim.clone());
            }
        }
        // HashSet iteration order is unspecified
        unanimous.sort();
        unanimous
    }

    /// Claims endorsed by one reviewer and disputed by another
    fn conflicts(&self, outputs: &[ReviewerOutput]) -> Vec<ModelConflict> {
        let mut conflicts: Vec<ModelConflict> = Vec::new();

        for supporter in outputs {
            for agreement in &supporter.agreements {
                let topic = self.text.normalize_claim(agreement);
                if topic.is_empty() {
                    continue;
                }

                let disputers: Vec<&str> = outputs
                    .iter()
                    .filter(|o| {
                        o.disagreements
                            .iter()
                            .any(|d| self.text.normalize_claim(d) == topic)
                    })
                    .map(|o| o.reviewer.as_str())
                    .collect();
                if disputers.is_empty() {
                    continue;
                }

                let index = match conflicts.iter().position(|c| c.topic == topic) {
                    Some(index) => index,
                    None => {
                        conflicts.push(ModelConflict {
                            topic: topic.clone(),
                            positions: BTreeMap::new(),
                        });
                        conflicts.len() - 1
                    }
                };
                let positions = &mut conflicts[index].positions;
                positions.insert(supporter.reviewer.clone(), SUPPORTS.to_string());
                for disputer in disputers {
                    positions.insert(disputer.to_string(), DISPUTES.to_string());
                }
            }
        }

        conflicts
    }
}

/// Confident findings only one reviewer reported, formatted `[severity] title`
fn unique_insights(clusters: &[FindingCluster]) -> BTreeMap<String, Vec<String>> {
    let mut insights: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for cluster in clusters.iter().filter(|c| c.is_single_source()) {
        for member in &cluster.members {
            if member.finding.confidence >= UNIQUE_INSIGHT_MIN_CONFIDENCE {
                insights
                    .entry(member.source.clone())
                    .or_default()
                    .push(format!("[{}] {}", member.finding.severity, member.finding.title));
            }
        }
    }

    insights
}

/// Synthesize a council report with default matching
pub fn synthesize(
    outputs: Vec<ReviewerOutput>,
    failed: Vec<String>,
    config: &ConsensusConfig,
) -> Result<CouncilReviewOutput> {
    Synthesizer::new(config.clone()).synthesize(outputs, failed)
}
