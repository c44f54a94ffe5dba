//! Finding data model shared by the verification and consensus engines
//!
//! Findings arrive already parsed and validated by an upstream layer. Nothing
//! in this crate mutates a finding; verification and consensus wrap them in
//! their own result types instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Area of concern a finding belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Security,
    Performance,
    Architecture,
    Correctness,
    Maintainability,
    Scalability,
    Testing,
    Documentation,
    BestPractice,
    Other,
}

impl Category {
    /// Get all categories
    pub fn all() -> &'static [Category] {
        &[
            Category::Security,
            Category::Performance,
            Category::Architecture,
            Category::Correctness,
            Category::Maintainability,
            Category::Scalability,
            Category::Testing,
            Category::Documentation,
            Category::BestPractice,
            Category::Other,
        ]
    }

    /// Get the wire name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Category::Security => "security",
            Category::Performance => "performance",
            Category::Architecture => "architecture",
            Category::Correctness => "correctness",
            Category::Maintainability => "maintainability",
            Category::Scalability => "scalability",
            Category::Testing => "testing",
            Category::Documentation => "documentation",
            Category::BestPractice => "best-practice",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase().replace('_', "-");
        Category::all()
            .iter()
            .copied()
            .find(|c| c.name() == lowered)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// How severe a finding is, from most to least
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Get the wire name for this severity
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            "info" => Ok(Severity::Info),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// Where in the codebase a finding points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path, relative to the working directory
    pub file: String,
    /// First line (1-based)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_start: Option<u32>,
    /// Last line (1-based, inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_end: Option<u32>,
}

impl Location {
    /// Create a location pointing at a whole file
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line_start: None,
            line_end: None,
        }
    }

    /// Create a location pointing at a single line
    pub fn line(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line_start: Some(line),
            line_end: None,
        }
    }

    /// Set the end line of the range
    pub fn through(mut self, line_end: u32) -> Self {
        self.line_end = Some(line_end);
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line_start, self.line_end) {
            (Some(start), Some(end)) if end > start => write!(f, "{}:{}-{}", self.file, start, end),
            (Some(start), _) => write!(f, "{}:{}", self.file, start),
            _ => write!(f, "{}", self.file),
        }
    }
}

/// One issue reported by a reviewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Identifier, unique only within one reviewer's output
    pub id: String,
    pub category: Category,
    pub severity: Severity,
    /// Reviewer's own confidence in [0, 1]
    pub confidence: f64,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Code the reviewer quotes as proof
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Finding {
    /// Create a finding without location, evidence, or suggestion
    pub fn new(
        id: impl Into<String>,
        category: Category,
        severity: Severity,
        confidence: f64,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            severity,
            confidence,
            title: title.into(),
            description: description.into(),
            location: None,
            evidence: None,
            suggestion: None,
            tags: Vec::new(),
        }
    }

    /// Attach a location
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Attach quoted evidence
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    /// Attach a suggested fix
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach free-form tags

    /// Title and description joined, used for lexical comparisons
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

/// Clamp a score into [0, 1], mapping NaN to 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Categorical risk level, ordered from least to most severe
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskLevel::Minimal => "minimal",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        write!(f, "{}", name)
    }
}

/// A reviewer's overall risk judgement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Numeric risk score (0-10 by convention)
    pub score: f64,
    pub level: RiskLevel,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub mitigations: Vec<String>,
}

/// A reviewer's overall verdict on the change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Approve,
    ApproveWithChanges,
    RequestChanges,
    Reject,
}

/// Everything one reviewer produced for a single review run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerOutput {
    /// Reviewer identifier (model or CLI name)
    pub reviewer: String,
    #[serde(default)]
    pub findings: Vec<Finding>,
    /// Claims this reviewer endorses
    #[serde(default)]
    pub agreements: Vec<String>,
    /// Claims this reviewer disputes
    #[serde(default)]
    pub disagreements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_assessment: Option<RiskAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ReviewerOutput {
    /// Create an output with only findings
    pub fn new(reviewer: impl Into<String>, findings: Vec<Finding>) -> Self {
        Self {
            reviewer: reviewer.into(),
            findings,
            agreements: Vec::new(),
            disagreements: Vec::new(),
            risk_assessment: None,
            recommendation: None,
            summary: None,
        }
    }

    /// Set the endorsed claims
    pub fn with_agreements(mut self, agreements: Vec<String>) -> Self {
        self.agreements = agreements;
        self
    }

    /// Set the disputed claims
    pub fn with_disagreements(mut self, disagreements: Vec<String>) -> Self {
        self.disagreements = disagreements;
        self
    }

    /// Set the risk assessment
    pub fn with_risk(mut self, risk: RiskAssessment) -> Self {
        self.risk_assessment = Some(risk);
        self
    }
}
