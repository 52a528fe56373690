use std::fmt;

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

// ── Findings ────────────────────────────────────────────────────────────────

/// Severity bucket of a finding. Ordered `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Most severe first.
    pub const RANKED: [Self; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    /// Case-insensitive parse; anything unrecognised is [`Severity::Low`].
    pub fn parse_lossy(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One issue reported by an analysis script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Empty when the finding is not tied to a file.
    pub file: String,
    /// 0 when unknown.
    pub line: u64,
    pub rule: String,
    pub message: String,
    pub severity: Severity,
}

// ── Per-script outcome ──────────────────────────────────────────────────────

/// What happened to one script of a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStatus {
    /// Ran and printed a findings document (possibly with zero issues).
    Ok,
    /// Ran and printed nothing usable.
    Empty,
    /// Ran but stdout was not a findings document.
    Unparseable,
    /// No launch strategy could start it.
    LaunchFailed,
    /// Killed after exceeding the timeout.
    TimedOut,
}

impl ScriptStatus {
    /// True for outcomes worth surfacing as a warning.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Unparseable | Self::LaunchFailed | Self::TimedOut)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRun {
    /// Script file name.
    pub script: String,
    pub status: ScriptStatus,
    /// Number of findings this script contributed.
    pub findings: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Failure reason for `unparseable`, `launch_failed` and `timed_out`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

// ── Results and report ──────────────────────────────────────────────────────

/// Findings of every script of one skill, in script invocation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillCheckResult {
    pub skill: String,
    pub category: String,
    pub issues: Vec<Finding>,
    pub scripts: Vec<ScriptRun>,
}

impl SkillCheckResult {
    pub fn new(skill: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            skill: skill.into(),
            category: category.into(),
            issues: Vec::new(),
            scripts: Vec::new(),
        }
    }

    /// Append one script's outcome and findings.
    pub fn record(&mut self, run: ScriptRun, findings: Vec<Finding>) {
        self.scripts.push(run);
        self.issues.extend(findings);
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|f| f.severity == severity).count()
    }
}

/// Counts derived from a set of results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_skills_checked: usize,
    pub total_issues: usize,
    pub critical_issues: usize,
    pub high_issues: usize,
    pub medium_issues: usize,
    pub low_issues: usize,
}

impl Summary {
    pub fn from_results(results: &[SkillCheckResult]) -> Self {
        results
            .iter()
            .flat_map(|r| &r.issues)
            .fold(
                Self {
                    total_skills_checked: results.len(),
                    ..Self::default()
                },
                |mut acc, finding| {
                    acc.total_issues += 1;
                    match finding.severity {
                        Severity::Critical => acc.critical_issues += 1,
                        Severity::High => acc.high_issues += 1,
                        Severity::Medium => acc.medium_issues += 1,
                        Severity::Low => acc.low_issues += 1,
                    }
                    acc
                },
            )
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical_issues,
            Severity::High => self.high_issues,
            Severity::Medium => self.medium_issues,
            Severity::Low => self.low_issues,
        }
    }
}

/// Aggregate of one run over a catalog. Immutable once built; the summary
/// is always computed from `results`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    generated_at: DateTime<Utc>,
    project_path: String,
    results: Vec<SkillCheckResult>,
    summary: Summary,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    cancelled: bool,
}

impl Report {
    pub fn new(project_path: impl Into<String>, results: Vec<SkillCheckResult>) -> Self {
        let summary = Summary::from_results(&results);
        Self {
            generated_at: Utc::now(),
            project_path: project_path.into(),
            results,
            summary,
            cancelled: false,
        }
    }

    /// Mark the report as covering only the units started before cancellation.
    #[must_use]
    pub fn cancelled(mut self, cancelled: bool) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn project_path(&self) -> &str {
        &self.project_path
    }

    pub fn results(&self) -> &[SkillCheckResult] {
        &self.results
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn has_critical(&self) -> bool {
        self.summary.critical_issues > 0
    }
}
