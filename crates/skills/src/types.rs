use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

// ── Priority ────────────────────────────────────────────────────────────────

/// How important a skill's guidance is. Ordered: `Critical > High > Medium > Low > Unknown`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Case-insensitive parse; anything unrecognised is [`Priority::Unknown`].
    pub fn parse_lossy(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Catalog entries ─────────────────────────────────────────────────────────

/// A named grouping of skills; one directory directly under the catalog root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub path: PathBuf,
}

/// Typed metadata of one skill, read from its definition frontmatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillEntry {
    /// Directory name; unique within its category.
    pub id: String,
    /// Name of the category directory holding this skill.
    pub category: String,
    /// Display name. Falls back to `id` when the frontmatter has none.
    pub name: String,
    pub description: String,
    pub version: String,
    pub priority: Priority,
    /// Free-form category tags declared by the skill itself.
    pub categories: Vec<String>,
    /// Trigger conditions.
    pub use_when: Vec<String>,
    pub prerequisites: Vec<String>,
    pub related_skills: Vec<String>,
    /// Skill directory.
    #[serde(skip)]
    pub path: PathBuf,
}

/// Full skill content: metadata + markdown body. Loaded on demand.
#[derive(Debug, Clone)]
pub struct SkillContent {
    pub entry: SkillEntry,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("critical", Priority::Critical)]
    #[case("HIGH", Priority::High)]
    #[case(" Medium ", Priority::Medium)]
    #[case("low", Priority::Low)]
    #[case("urgent", Priority::Unknown)]
    #[case("", Priority::Unknown)]
    fn priority_parse_lossy(#[case] raw: &str, #[case] expected: Priority) {
        assert_eq!(Priority::parse_lossy(raw), expected);
    }

    #[test]
    fn priority_orders_critical_highest() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert!(Priority::Low > Priority::Unknown);
    }
}
