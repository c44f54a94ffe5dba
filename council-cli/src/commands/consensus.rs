//! Consensus command - Reconcile several reviewers into one council report

use std::path::PathBuf;

use clap::Args;
use council_core::{Config, Synthesizer};

use super::load;

/// Arguments for the consensus command
#[derive(Args, Debug)]
pub struct ConsensusArgs {
    /// Reviewer output JSON files, one per reviewer
    #[arg(required = true)]
    pub reviews: Vec<PathBuf>,

    /// Reviewers that failed before producing output
    #[arg(long, value_delimiter = ',')]
    pub failed: Vec<String>,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ConsensusArgs {
    /// Execute the consensus command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let loaded = load::load_reviewer_outputs(&self.reviews).await;

        let mut failed = self.failed.clone();
        failed.extend(loaded.failed);

        if loaded.outputs.is_empty() {
            anyhow::bail!(
                "No reviewer outputs could be loaded ({} failed)",
                failed.len()
            );
        }

        if verbose {
            tracing::info!(
                reviewers = loaded.outputs.len(),
                failed = failed.len(),
                similarity_threshold = config.consensus.similarity_threshold,
                "Starting consensus synthesis"
            );
        }

        let report = Synthesizer::new(config.consensus.clone()).synthesize(loaded.outputs, failed)?;

        if verbose {
            tracing::info!(
                consensus_findings = report.consensus_findings.len(),
                unanimous = report.unanimous_agreements.len(),
                conflicts = report.conflicts.len(),
                "Consensus synthesis complete"
            );
        }

        super::emit(&report, self.output.as_deref()).await
    }
}
