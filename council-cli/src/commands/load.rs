//! Loading typed reviewer input files
//!
//! Files must already match the finding shapes exactly; no repair of
//! malformed reviewer output happens here.

use std::path::{Path, PathBuf};

use anyhow::Context;
use council_core::verify::PriorAnalysis;
use council_core::{Finding, ReviewerOutput};
use serde::Deserialize;

/// A findings file is either a bare array or a full reviewer output
#[derive(Deserialize)]
#[serde(untagged)]
enum FindingsFile {
    Findings(Vec<Finding>),
    Reviewer(ReviewerOutput),
}

/// Reviewer outputs that loaded, plus the ids of those that did not
#[derive(Debug, Default)]
pub struct LoadedReviewers {
    pub outputs: Vec<ReviewerOutput>,
    pub failed: Vec<String>,
}

/// Load the findings of a single reviewer
pub async fn load_findings(path: &Path) -> anyhow::Result<Vec<Finding>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: FindingsFile = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse findings in {}", path.display()))?;

    Ok(match file {
        FindingsFile::Findings(findings) => findings,
        FindingsFile::Reviewer(output) => output.findings,
    })
}

/// Load a prior analysis record
pub async fn load_prior(path: &Path) -> anyhow::Result<PriorAnalysis> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse prior analysis in {}", path.display()))
}

async fn load_reviewer_output(path: PathBuf) -> anyhow::Result<ReviewerOutput> {
    let contents = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse reviewer output in {}", path.display()))
}

/// Load every reviewer output concurrently
///
/// A file that cannot be read or parsed is recorded as failed under its file
/// stem; the rest still load. Outputs keep the order of `paths`.
pub async fn load_reviewer_outputs(paths: &[PathBuf]) -> LoadedReviewers {
    let handles: Vec<_> = paths
        .iter()
        .cloned()
        .map(|path| tokio::spawn(load_reviewer_output(path)))
        .collect();

    let mut loaded = LoadedReviewers::default();
    for (path, handle) in paths.iter().zip(handles) {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(anyhow::anyhow!("Loader task failed: {}", e)),
        };

        match result {
            Ok(output) => {
                tracing::debug!(
                    reviewer = %output.reviewer,
                    findings = output.findings.len(),
                    "Loaded reviewer output"
                );
                loaded.outputs.push(output);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Reviewer output unavailable: {:#}", e);
                loaded.failed.push(reviewer_id_for(path));
            }
        }
    }

    loaded
}

fn reviewer_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const FINDING: &str = r#"{
        "id": "f1",
        "category": "security",
        "severity": "high",
        "confidence": 0.9,
        "title": "Hardcoded key",
        "description": "API key committed to source",
        "location": {"file": "src/config.rs", "line_start": 3}
    }"#;

    #[tokio::test]
    async fn test_load_findings_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("findings.json");
        fs::write(&path, format!("[{}]", FINDING)).unwrap();

        let findings = load_findings(&path).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].id, "f1");
    }

    #[tokio::test]
    async fn test_load_findings_from_reviewer_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("claude.json");
        fs::write(
            &path,
            format!(r#"{{"reviewer": "claude", "findings": [{}]}}"#, FINDING),
        )
        .unwrap();

        let findings = load_findings(&path).await.unwrap();
        assert_eq!(findings.len(), 1);
    }

    #[tokio::test]
    async fn test_load_prior() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prior.json");
        fs::write(
            &path,
            r#"{"findings": [{"description": "Key rotated", "addressed": true}], "assumptions": ["Keys live in vault"]}"#,
        )
        .unwrap();

        let prior = load_prior(&path).await.unwrap();
        assert!(prior.findings[0].addressed);
        assert_eq!(prior.assumptions.len(), 1);
    }

    #[tokio::test]
    async fn test_partial_reviewer_failure() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("claude.json");
        let broken = dir.path().join("gemini.json");
        let missing = dir.path().join("codex.json");
        fs::write(&good, format!(r#"{{"reviewer": "claude", "findings": [{}]}}"#, FINDING)).unwrap();
        fs::write(&broken, "{not json").unwrap();

        let loaded = load_reviewer_outputs(&[good, broken, missing]).await;

        assert_eq!(loaded.outputs.len(), 1);
        assert_eq!(loaded.outputs[0].reviewer, "claude");
        assert_eq!(loaded.failed, vec!["gemini", "codex"]);
    }
}
