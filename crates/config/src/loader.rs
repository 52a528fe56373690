use std::path::{Path, PathBuf};

use {
    skillpack_common::{Error, Result},
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::SkillpackConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "skillpack.toml",
    "skillpack.yaml",
    "skillpack.yml",
    "skillpack.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<SkillpackConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::message(format!("failed to read {}: {e}", path.display())))?;
    parse_config(&substitute_env(&raw), path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./skillpack.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/skillpack/skillpack.{toml,yaml,yml,json}` (user-global)
///
/// Returns `SkillpackConfig::default()` if no file is found or the one found
/// cannot be loaded.
pub fn discover_and_load() -> SkillpackConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return SkillpackConfig::default();
    };

    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            SkillpackConfig::default()
        },
    }
}

/// Returns the user-global config directory (`~/.config/skillpack/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "skillpack").map(|d| d.config_dir().to_path_buf())
}

fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.is_file())
}

fn parse_config(raw: &str, path: &Path) -> Result<SkillpackConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| Error::decode("toml", e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::decode("yaml", e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::decode("json", e)),
        _ => Err(Error::message(format!("unsupported config format: .{ext}"))),
    }
}
