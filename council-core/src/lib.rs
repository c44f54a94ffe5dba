//! Council Core - verification and consensus for multi-reviewer findings
//!
//! Independent reviewers (external AI assistants) analyze the same codebase
//! and report [`Finding`]s. This crate provides two things on top of those
//! findings:
//!
//! - a per-reviewer pipeline ([`verify`]) that checks each finding's claimed
//!   file, line, and evidence against the working tree and turns it into a
//!   ranked action plan
//! - a cross-reviewer consensus engine ([`consensus`]) that clusters similar
//!   findings, scores agreement, and synthesizes a council report
//!
//! Everything here is synchronous and performs no network access.

pub mod config;
pub mod consensus;
pub mod error;
pub mod finding;
pub mod text;
pub mod verify;

pub use config::{Config, ConsensusConfig};
pub use consensus::{
    synthesize, ConsensusFinding, CouncilReviewOutput, FindingCluster, ModelConflict,
    PeerValidation, Synthesizer,
};
pub use error::{Error, Result};
pub use finding::{
    Category, Finding, Location, Recommendation, ReviewerOutput, RiskAssessment, RiskLevel,
    Severity,
};
pub use text::{LexicalSimilarity, TextSimilarity};
pub use verify::{
    generate_follow_up_questions, process_review, ActionItem, FileCache, FollowUpQuestion,
    PriorAnalysis, ProcessedReview, RecommendedAction, ReviewPipeline, VerifiedFinding,
};
