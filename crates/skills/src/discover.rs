use std::path::{Path, PathBuf};

#[cfg(feature = "metrics")]
use skillpack_metrics::{catalog as catalog_metrics, counter};

use crate::{
    error::{Context, Error, Result},
    locate::{self, ScriptLookup},
    parse,
    types::{Category, SkillContent, SkillEntry},
};

/// Definition document looked up in every skill directory.
pub const DEFAULT_DEFINITION_FILE: &str = "SKILL.md";

/// A catalog rooted at a directory of categories.
///
/// Nothing is cached: every call walks the filesystem again, so a `Catalog`
/// is cheap to clone and always reflects what is on disk.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
    definition_file: String,
}

impl Catalog {
    /// Open a catalog, failing with [`Error::CatalogNotFound`] if `root` is
    /// not a directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::catalog_not_found(&root));
        }
        Ok(Self {
            root,
            definition_file: DEFAULT_DEFINITION_FILE.to_string(),
        })
    }

    /// Use a different definition file name than `SKILL.md`.
    #[must_use]
    pub fn with_definition_file(mut self, name: impl Into<String>) -> Self {
        self.definition_file = name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Category directories, sorted by name.
    pub fn categories(&self) -> Result<Vec<Category>> {
        let dirs = sorted_subdirs(&self.root).map_err(|e| {
            tracing::debug!(root = %self.root.display(), %e, "catalog root unreadable");
            Error::catalog_not_found(&self.root)
        })?;
        Ok(dirs
            .into_iter()
            .map(|(name, path)| Category { name, path })
            .collect())
    }

    /// Every parseable skill, sorted by category then skill directory name.
    ///
    /// `category_filter` keeps only the category whose name matches
    /// case-insensitively; no match yields an empty list. Entries whose
    /// definition is missing or malformed are skipped with a warning.
    pub fn list_skills(&self, category_filter: Option<&str>) -> Result<Vec<SkillEntry>> {
        let mut skills = Vec::new();

        for category in self.categories()? {
            if let Some(filter) = category_filter
                && !category.name.eq_ignore_ascii_case(filter)
            {
                continue;
            }
            self.discover_category(&category, &mut skills);
        }

        #[cfg(feature = "metrics")]
        counter!(catalog_metrics::SKILLS_DISCOVERED_TOTAL).increment(skills.len() as u64);

        Ok(skills)
    }

    /// Load the full content of the first skill named `skill_id`, scanning
    /// categories in sorted order.
    pub fn load_skill(&self, skill_id: &str) -> Result<Option<SkillContent>> {
        if !locate::is_plain_name(skill_id) {
            return Ok(None);
        }
        for category in self.categories()? {
            let skill_dir = category.path.join(skill_id);
            let doc = skill_dir.join(&self.definition_file);
            if !doc.is_file() {
                continue;
            }
            let content = std::fs::read_to_string(&doc)
                .with_context(|| format!("failed to read {}", doc.display()))?;
            return parse::parse_skill(&content, &skill_dir, &category.name).map(Some);
        }
        Ok(None)
    }

    /// Analysis scripts of `skill_id`. See [`locate::find_scripts`].
    pub fn find_scripts(&self, skill_id: &str) -> Result<ScriptLookup> {
        locate::find_scripts(&self.root, skill_id)
    }

    fn discover_category(&self, category: &Category, skills: &mut Vec<SkillEntry>) {
        let dirs = match sorted_subdirs(&category.path) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(category = %category.name, %e, "failed to read category");
                return;
            },
        };

        for (_, skill_dir) in dirs {
            let doc = skill_dir.join(&self.definition_file);
            if !doc.is_file() {
                tracing::debug!(?skill_dir, "no definition document, skipping");
                continue;
            }
            let content = match std::fs::read_to_string(&doc) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(?doc, %e, "failed to read skill definition");
                    continue;
                },
            };
            match parse::parse_metadata(&content, &skill_dir, &category.name) {
                Ok(entry) => skills.push(entry),
                Err(e) => {
                    #[cfg(feature = "metrics")]
                    counter!(catalog_metrics::PARSE_ERRORS_TOTAL).increment(1);

                    tracing::warn!(?skill_dir, %e, "skipping skill with unreadable metadata");
                },
            }
        }
    }
}

/// Convenience: open `root` and list its skills.
pub fn list_skills(root: &Path, category_filter: Option<&str>) -> Result<Vec<SkillEntry>> {
    Catalog::open(root)?.list_skills(category_filter)
}

/// Non-hidden subdirectories of `dir` as (name, path), sorted by name.
pub(crate) fn sorted_subdirs(dir: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut dirs: Vec<(String, PathBuf)> = std::fs::read_dir(dir)?
        .flatten()
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            (!name.starts_with('.')).then(|| (name, entry.path()))
        })
        .collect();
    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(dirs)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn write_skill(root: &Path, category: &str, skill: &str, doc: &str) {
        let dir = root.join(category).join(skill);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("SKILL.md"), doc).unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write_skill(root, "auth", "jwt", "---\nname: jwt\npriority: critical\n---\n");
        write_skill(root, "api", "versioning", "---\nname: versioning\n---\n");
        write_skill(root, "api", "pagination", "---\nname: pagination\n---\n");
        write_skill(root, "api", "broken", "no frontmatter here");
        std::fs::create_dir_all(root.join("api/no-doc")).unwrap();
        std::fs::create_dir_all(root.join(".git/objects")).unwrap();
        std::fs::write(root.join("README.md"), "catalog").unwrap();
        tmp
    }

    #[test]
    fn open_missing_root_is_catalog_not_found() {
        let err = Catalog::open("/nonexistent/catalog/root").unwrap_err();
        assert!(matches!(err, Error::CatalogNotFound { .. }));
    }

    #[test]
    fn open_file_root_is_catalog_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("file");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(
            Catalog::open(&file),
            Err(Error::CatalogNotFound { .. })
        ));
    }

    #[test]
    fn lists_sorted_by_category_then_skill() {
        let tmp = fixture();
        let skills = list_skills(tmp.path(), None).unwrap();
        let ids: Vec<_> = skills
            .iter()
            .map(|s| format!("{}/{}", s.category, s.id))
            .collect();
        assert_eq!(ids, vec!["api/pagination", "api/versioning", "auth/jwt"]);
    }

    #[test]
    fn listing_is_repeatable() {
        let tmp = fixture();
        let catalog = Catalog::open(tmp.path()).unwrap();
        assert_eq!(
            catalog.list_skills(None).unwrap(),
            catalog.list_skills(None).unwrap()
        );
    }

    #[test]
    fn malformed_entry_does_not_stop_siblings() {
        let tmp = fixture();
        let skills = list_skills(tmp.path(), Some("api")).unwrap();
        assert_eq!(skills.len(), 2);
        assert!(skills.iter().all(|s| s.id != "broken" && s.id != "no-doc"));
    }

    #[test]
    fn category_filter_is_case_insensitive() {
        let tmp = fixture();
        let skills = list_skills(tmp.path(), Some("AUTH")).unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].id, "jwt");
    }

    #[test]
    fn unknown_category_filter_yields_empty() {
        let tmp = fixture();
        assert!(list_skills(tmp.path(), Some("nope")).unwrap().is_empty());
    }

    #[test]
    fn custom_definition_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("docs/readme-skill");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("GUIDE.md"), "---\nname: guide\n---\n").unwrap();

        let catalog = Catalog::open(tmp.path())
            .unwrap()
            .with_definition_file("GUIDE.md");
        assert_eq!(catalog.list_skills(None).unwrap().len(), 1);
    }

    #[test]
    fn load_skill_returns_body_of_first_match() {
        let tmp = fixture();
        write_skill(
            tmp.path(),
            "zzz",
            "jwt",
            "---\nname: shadowed\n---\nnot me\n",
        );
        let catalog = Catalog::open(tmp.path()).unwrap();
        let skill = catalog.load_skill("jwt").unwrap().unwrap();
        assert_eq!(skill.entry.category, "auth");
        assert!(catalog.load_skill("missing").unwrap().is_none());
        assert!(catalog.load_skill("../auth").unwrap().is_none());
    }
}
