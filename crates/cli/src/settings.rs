//! Effective settings: CLI flags (and their env vars) over the config file
//! over built-in defaults.

use std::path::{Path, PathBuf};

use {
    anyhow::Context,
    skillpack_config::{ChecksConfig, SkillpackConfig},
    skillpack_skills::Catalog,
};

pub struct Settings {
    pub root: PathBuf,
    pub definition_file: String,
    pub checks: ChecksConfig,
}

impl Settings {
    /// `root` and `config` already carry `SKILLPACK_ROOT` / `SKILLPACK_CONFIG`
    /// through clap.
    pub fn resolve(root: Option<PathBuf>, config: Option<&Path>) -> anyhow::Result<Self> {
        let file = match config {
            Some(path) => skillpack_config::load_config(path)
                .with_context(|| format!("invalid config file {}", path.display()))?,
            None => skillpack_config::discover_and_load(),
        };
        Ok(Self::merge(root, file))
    }

    fn merge(root: Option<PathBuf>, file: SkillpackConfig) -> Self {
        Self {
            root: root.unwrap_or_else(|| file.catalog.root_or_default()),
            definition_file: file.catalog.definition_file,
            checks: file.checks,
        }
    }

    pub fn open_catalog(&self) -> anyhow::Result<Catalog> {
        Ok(Catalog::open(&self.root)?.with_definition_file(&self.definition_file))
    }
}
