//! Per-reviewer finding verification
//!
//! Checks each finding's claimed file, line, and evidence against the working
//! tree, cross-checks it against a prior analysis, and ranks the survivors
//! into an action plan. All checks are filesystem and string level.

mod cache;
mod cross_check;
mod follow_up;
mod paths;
mod pipeline;
mod priority;
mod verifier;

pub use cache::{CacheStats, FileCache};
pub use cross_check::{cross_check, PriorAnalysis, PriorFinding};
pub use follow_up::{generate_follow_up_questions, FollowUpQuestion, QuestionKind};
pub use paths::{location_file, normalize_lexically, resolve_within};
pub use pipeline::{process_review, ProcessedReview, RejectedFinding, ReviewPipeline, ReviewSummary};
pub use priority::{decide_action, prioritize, priority, ActionItem, RecommendedAction};
pub use verifier::{
    evidence_matches, verify_finding, verify_finding_in, CrossCheck, Verification,
    VerifiedFinding,
};
