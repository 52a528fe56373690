//! Script location: which analysis programs belong to a skill.

use std::path::{Path, PathBuf};

use crate::{
    discover::sorted_subdirs,
    error::{Error, Result},
};

/// Name of the per-skill directory holding analysis programs.
pub const SCRIPTS_DIR: &str = "scripts";

/// Extensions recognised as scripts even without the executable bit.
const SCRIPT_EXTENSIONS: &[&str] = &["py", "sh", "bash", "js", "mjs", "ts", "rb", "pl"];

/// Outcome of resolving a skill's scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptLookup {
    /// No category contains a skill with that identifier.
    NotFound,
    /// The skill exists. `scripts` may be empty.
    Found(ScriptSet),
}

impl ScriptLookup {
    /// Scripts to run; empty for [`ScriptLookup::NotFound`].
    pub fn scripts(&self) -> &[PathBuf] {
        match self {
            Self::NotFound => &[],
            Self::Found(set) => &set.scripts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSet {
    /// Category the skill was resolved in.
    pub category: String,
    pub skill_dir: PathBuf,
    /// Sorted by file name.
    pub scripts: Vec<PathBuf>,
}

/// Resolve the analysis scripts of `skill_id` under `root`.
///
/// Categories are scanned in sorted order and the first one whose
/// `<skill_id>/scripts/` directory exists wins, even when another category
/// has a skill with the same identifier. A skill that exists but has no
/// scripts directory anywhere resolves to an empty [`ScriptSet`].
pub fn find_scripts(root: &Path, skill_id: &str) -> Result<ScriptLookup> {
    if !root.is_dir() {
        return Err(Error::catalog_not_found(root));
    }
    if !is_plain_name(skill_id) {
        return Ok(ScriptLookup::NotFound);
    }

    let mut first_without_scripts: Option<ScriptSet> = None;

    for (category, category_dir) in sorted_subdirs(root)? {
        let skill_dir = category_dir.join(skill_id);
        if !skill_dir.is_dir() {
            continue;
        }
        let scripts_dir = skill_dir.join(SCRIPTS_DIR);
        if scripts_dir.is_dir() {
            // An unreadable scripts directory only costs this skill its checks.
            let scripts = list_scripts(&scripts_dir).unwrap_or_else(|e| {
                tracing::warn!(?scripts_dir, %e, "failed to read scripts directory");
                Vec::new()
            });
            return Ok(ScriptLookup::Found(ScriptSet {
                category,
                skill_dir,
                scripts,
            }));
        }
        first_without_scripts.get_or_insert(ScriptSet {
            category,
            skill_dir,
            scripts: Vec::new(),
        });
    }

    Ok(first_without_scripts.map_or(ScriptLookup::NotFound, ScriptLookup::Found))
}

/// A single path component that can't escape its parent directory.
pub(crate) fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

fn list_scripts(scripts_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut scripts: Vec<PathBuf> = std::fs::read_dir(scripts_dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| is_script(path))
        .collect();
    scripts.sort();
    Ok(scripts)
}

fn is_script(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    // Hidden files and `_helpers.py` / `__init__.py` are not entry points.
    if name.starts_with('.') || name.starts_with('_') {
        return false;
    }
    let known_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext));
    known_ext || is_executable(path)
}

#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    false
}
