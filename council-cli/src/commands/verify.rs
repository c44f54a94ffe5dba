//! Verify command - Check one reviewer's findings against the working tree

use std::path::PathBuf;

use clap::Args;
use council_core::{generate_follow_up_questions, FollowUpQuestion, ProcessedReview, ReviewPipeline};
use serde::Serialize;

use super::load;

/// Arguments for the verify command
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// JSON file with the findings (an array or a full reviewer output)
    #[arg(required = true)]
    pub findings: PathBuf,

    /// Working directory the findings refer to (defaults to current directory)
    #[arg(short = 'd', long, default_value = ".")]
    pub workdir: PathBuf,

    /// JSON file with a prior analysis to cross-check against
    #[arg(long)]
    pub prior: Option<PathBuf>,

    /// Include follow-up questions for the reviewer
    #[arg(long)]
    pub questions: bool,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyReport {
    #[serde(flatten)]
    review: ProcessedReview,
    #[serde(skip_serializing_if = "Option::is_none")]
    follow_up_questions: Option<Vec<FollowUpQuestion>>,
}

impl VerifyArgs {
    /// Execute the verify command
    pub async fn execute(&self, verbose: bool) -> anyhow::Result<()> {
        // Resolve to absolute path
        let workdir = if self.workdir.is_absolute() {
            self.workdir.clone()
        } else {
            std::env::current_dir()?.join(&self.workdir)
        };

        let findings = load::load_findings(&self.findings).await?;

        let mut pipeline = ReviewPipeline::new(&workdir);
        if let Some(path) = &self.prior {
            pipeline = pipeline.with_prior(load::load_prior(path).await?);
        }

        if verbose {
            tracing::info!(
                findings = findings.len(),
                workdir = %workdir.display(),
                prior = self.prior.is_some(),
                "Starting verification"
            );
        }

        let review = pipeline.process(&findings);
        let follow_up_questions = self
            .questions
            .then(|| generate_follow_up_questions(&review));

        if verbose {
            let summary = &review.summary;
            tracing::info!(
                verified = summary.verified,
                rejected = summary.rejected,
                fix_now = summary.fix_now,
                investigate = summary.investigate,
                defer = summary.defer,
                "Verification complete"
            );
        }

        let report = VerifyReport {
            review,
            follow_up_questions,
        };
        super::emit(&report, self.output.as_deref()).await
    }
}
