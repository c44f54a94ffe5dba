//! Cross-reviewer consensus
//!
//! Clusters similar findings reported by different reviewers, scores how
//! strongly they agree, and synthesizes a single council report with
//! agreements, conflicts, unique insights, and a combined risk assessment.
//! Every synthesis starts from a fresh snapshot of reviewer outputs; nothing
//! is updated incrementally.

mod cluster;
mod risk;
mod scoring;
mod similarity;
mod synthesis;

pub use cluster::{cluster_findings, FindingCluster, SourcedFinding};
pub use risk::combine_risk;
pub use scoring::{consensus_score, passes_filter};
pub use similarity::{FindingSimilarity, WeightedSimilarity};
pub use synthesis::{
    synthesize, ConsensusFinding, CouncilReviewOutput, ModelConflict, PeerValidation, Synthesizer,
};
