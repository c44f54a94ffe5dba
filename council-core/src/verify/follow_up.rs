//! Follow-up questions for findings that need a human decision

use serde::{Deserialize, Serialize};

use super::pipeline::ProcessedReview;
use super::priority::{ActionItem, RecommendedAction};

/// Why a follow-up question was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Quoted evidence does not match the referenced code
    EvidenceMismatch,
    /// The finding contradicts an assumption of the prior analysis
    PriorConflict,
}

/// A question to put back to the reviewer or the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpQuestion {
    pub finding_ids: Vec<String>,
    pub kind: QuestionKind,
    pub question: String,
    /// `file:line`, `file`, or "no location"
    pub context: String,
}

/// Derive follow-up questions from every `investigate` item in a review
pub fn generate_follow_up_questions(review: &ProcessedReview) -> Vec<FollowUpQuestion> {
    let mut questions = Vec::new();

    for item in review
        .action_plan
        .iter()
        .filter(|item| item.action == RecommendedAction::Investigate)
    {
        let verified = &item.finding;
        let finding = &verified.finding;
        let context = context_of(item);

        if verified.verification.code_snippet_matches == Some(false) {
            questions.push(FollowUpQuestion {
                finding_ids: vec![finding.id.clone()],
                kind: QuestionKind::EvidenceMismatch,
                question: format!(
                    "The evidence for \"{}\" doesn't match the code at {}. Please verify the location and quoted code.",
                    finding.title, context
                ),
                context: context.clone(),
            });
        }

        if verified.cross_check.conflicts_with_cc {
            questions.push(FollowUpQuestion {
                finding_ids: vec![finding.id.clone()],
                kind: QuestionKind::PriorConflict,
                question: format!(
                    "\"{}\" conflicts with an assumption from the prior analysis. Which is correct?",
                    finding.title
                ),
                context,
            });
        }
    }

    questions
}

fn context_of(item: &ActionItem) -> String {
    item.finding
        .finding
        .location
        .as_ref()
        .map(|l| l.to_string())
        .unwrap_or_else(|| "no location".to_string())
}
