//! Config schema types.

use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillpackConfig {
    pub catalog: CatalogConfig,
    pub checks: ChecksConfig,
}

/// Where the skill catalog lives and what its definition documents are called.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog root. Relative paths resolve against the working directory.
    pub root: Option<PathBuf>,
    /// File name of the definition document inside each skill directory.
    pub definition_file: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root: None,
            definition_file: "SKILL.md".into(),
        }
    }
}

impl CatalogConfig {
    /// Configured root, or `./skills`.
    pub fn root_or_default(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| PathBuf::from("skills"))
    }
}

/// How analysis scripts are launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksConfig {
    /// Maximum number of scripts running at once. `None` = available parallelism.
    pub concurrency: Option<usize>,
    /// Per-script timeout in seconds. `0` disables the timeout.
    pub timeout_secs: u64,
    /// File extension → interpreter candidates, tried in order. A candidate
    /// may carry leading arguments (`"npx tsx"`).
    pub interpreters: BTreeMap<String, Vec<String>>,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            concurrency: None,
            timeout_secs: 300,
            interpreters: default_interpreters(),
        }
    }
}

impl ChecksConfig {
    /// Effective worker count, never zero.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency
            .filter(|n| *n > 0)
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(4)
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_secs > 0).then(|| std::time::Duration::from_secs(self.timeout_secs))
    }
}

fn default_interpreters() -> BTreeMap<String, Vec<String>> {
    let table: &[(&str, &[&str])] = &[
        ("py", &["python3", "python"]),
        ("sh", &["bash", "sh"]),
        ("bash", &["bash"]),
        ("js", &["node"]),
        ("mjs", &["node"]),
        ("ts", &["npx tsx"]),
        ("rb", &["ruby"]),
        ("pl", &["perl"]),
    ];
    table
        .iter()
        .map(|(ext, cmds)| {
            (
                (*ext).to_string(),
                cmds.iter().map(|c| (*c).to_string()).collect(),
            )
        })
        .collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_python_with_fallback() {
        let cfg = SkillpackConfig::default();
        assert_eq!(cfg.checks.interpreters["py"], vec!["python3", "python"]);
        assert_eq!(cfg.catalog.definition_file, "SKILL.md");
        assert_eq!(cfg.catalog.root_or_default(), PathBuf::from("skills"));
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg: SkillpackConfig = toml::from_str("[checks]\nconcurrency = 2\n").unwrap();
        assert_eq!(cfg.checks.concurrency, Some(2));
        assert_eq!(cfg.checks.timeout_secs, 300);
        assert!(cfg.checks.interpreters.contains_key("sh"));
    }

    #[test]
    fn zero_concurrency_falls_back_to_parallelism() {
        let checks = ChecksConfig {
            concurrency: Some(0),
            ..ChecksConfig::default()
        };
        assert!(checks.effective_concurrency() >= 1);
    }

    #[test]
    fn zero_timeout_disables_it() {
        let checks = ChecksConfig {
            timeout_secs: 0,
            ..ChecksConfig::default()
        };
        assert!(checks.timeout().is_none());
    }
}
