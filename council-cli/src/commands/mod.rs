//! CLI command implementations

pub mod consensus;
pub mod load;
pub mod verify;

pub use consensus::ConsensusArgs;
pub use verify::VerifyArgs;

use std::path::Path;

use anyhow::Context;
use serde::Serialize;

/// Print a report as pretty JSON, or write it to `output`
async fn emit<T: Serialize>(report: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    match output {
        Some(path) => {
            tokio::fs::write(path, format!("{}\n", json))
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Report written");
        }
        None => println!("{}", json),
    }
    Ok(())
}
