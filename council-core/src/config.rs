//! Configuration management for the council engine
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (COUNCIL_*)
//! 3. Config file (~/.config/council/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Consensus policy knobs
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Clusters scoring below this are dropped from the report
    pub min_consensus_threshold: f64,

    /// Maximum multiplier applied when every reviewer agrees
    pub agreement_boost: f64,

    /// Multiplier applied to findings some reviewer explicitly disputes
    pub dispute_penalty: f64,

    /// Keep findings only one reviewer reported (subject to the confidence floor)
    pub include_single_source_findings: bool,

    /// Raw confidence a single-source finding needs to be kept
    pub single_source_min_confidence: f64,

    /// Similarity a candidate needs against a cluster seed to be absorbed
    pub similarity_threshold: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            min_consensus_threshold: 0.3,
            agreement_boost: 1.5,
            dispute_penalty: 0.5,
            include_single_source_findings: true,
            single_source_min_confidence: 0.7,
            similarity_threshold: 0.6,
        }
    }
}

impl ConsensusConfig {
    /// Check that every knob is in its meaningful range
    pub fn validate(&self) -> Result<()> {
        let unit = [
            ("min_consensus_threshold", self.min_consensus_threshold),
            ("dispute_penalty", self.dispute_penalty),
            (
                "single_source_min_confidence",
                self.single_source_min_confidence,
            ),
            ("similarity_threshold", self.similarity_threshold),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.agreement_boost.is_nan() || self.agreement_boost < 1.0 {
            return Err(Error::Config(format!(
                "agreement_boost must be at least 1.0, got {}",
                self.agreement_boost
            )));
        }

        Ok(())
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Consensus configuration
    pub consensus: ConsensusConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/council/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("council").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - COUNCIL_MIN_CONSENSUS: minimum consensus score
    /// - COUNCIL_SIMILARITY_THRESHOLD: clustering similarity threshold
    /// - COUNCIL_AGREEMENT_BOOST: agreement boost multiplier
    ///
    /// Unparseable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_f64("COUNCIL_MIN_CONSENSUS") {
            self.consensus.min_consensus_threshold = v;
        }

        if let Some(v) = env_f64("COUNCIL_SIMILARITY_THRESHOLD") {
            self.consensus.similarity_threshold = v;
        }

        if let Some(v) = env_f64("COUNCIL_AGREEMENT_BOOST") {
            self.consensus.agreement_boost = v;
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(
        mut self,
        min_consensus: Option<f64>,
        similarity_threshold: Option<f64>,
    ) -> Self {
        if let Some(v) = min_consensus {
            self.consensus.min_consensus_threshold = v;
        }

        if let Some(v) = similarity_threshold {
            self.consensus.similarity_threshold = v;
        }

        self
    }

    /// Load configuration with all overrides applied and validated
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        min_consensus: Option<f64>,
        similarity_threshold: Option<f64>,
    ) -> Result<Self> {
        let config = Self::load()?
            .with_env_overrides()
            .with_cli_overrides(min_consensus, similarity_threshold);
        config.consensus.validate()?;
        Ok(config)
    }
}

fn env_f64(name: &str) -> Option<f64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            debug!(name, value = %raw, "Ignoring unparseable numeric override");
            None
        }
    }
}
