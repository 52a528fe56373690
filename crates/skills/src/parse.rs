//! Definition document parsing.
//!
//! The frontmatter is decoded into a generic YAML value and every recognised
//! key is pulled out field by field, so one malformed field falls back to its
//! default instead of rejecting the whole skill. Only a missing frontmatter
//! block or one that is not a YAML mapping rejects the document.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::{
    error::{Error, Result},
    types::{Priority, SkillContent, SkillEntry},
};

const DELIMITER: &str = "---";

/// Parse a definition document into metadata only.
pub fn parse_metadata(content: &str, skill_dir: &Path, category: &str) -> Result<SkillEntry> {
    let (frontmatter, _body) = split_frontmatter(content, skill_dir)?;
    decode_entry(frontmatter, skill_dir, category)
}

/// Parse a definition document into full content (metadata + body).
pub fn parse_skill(content: &str, skill_dir: &Path, category: &str) -> Result<SkillContent> {
    let (frontmatter, body) = split_frontmatter(content, skill_dir)?;
    Ok(SkillContent {
        entry: decode_entry(frontmatter, skill_dir, category)?,
        body: body.to_string(),
    })
}

/// Split at the `---` delimiters into (frontmatter, body).
fn split_frontmatter<'a>(content: &'a str, skill_dir: &Path) -> Result<(&'a str, &'a str)> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    let Some(after_open) = trimmed.strip_prefix(DELIMITER) else {
        return Err(Error::invalid_metadata(
            skill_dir,
            "document must start with frontmatter delimited by ---",
        ));
    };

    let close_pos = after_open
        .find("\n---")
        .ok_or_else(|| Error::invalid_metadata(skill_dir, "missing closing --- for frontmatter"))?;

    let frontmatter = after_open[..close_pos].trim();
    let body = after_open[close_pos + 4..].trim();
    Ok((frontmatter, body))
}

fn decode_entry(frontmatter: &str, skill_dir: &Path, category: &str) -> Result<SkillEntry> {
    let value: Value = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::invalid_metadata(skill_dir, e.to_string()))?;
    let Value::Mapping(root) = value else {
        return Err(Error::invalid_metadata(
            skill_dir,
            "frontmatter is not a key/value mapping",
        ));
    };

    let fields = Fields::new(&root);
    let id = skill_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(SkillEntry {
        name: fields.string(&["name"]).unwrap_or_else(|| id.clone()),
        description: fields.string(&["description"]).unwrap_or_default(),
        version: fields.string(&["version"]).unwrap_or_default(),
        priority: fields
            .string(&["priority"])
            .map(|p| Priority::parse_lossy(&p))
            .unwrap_or_default(),
        categories: fields.list(&["categories", "category"]),
        use_when: fields.list(&["use_when", "use-when"]),
        prerequisites: fields.list(&["prerequisites"]),
        related_skills: fields.list(&["related_skills", "related-skills"]),
        id,
        category: category.to_string(),
        path: skill_dir.to_path_buf(),
    })
}

/// Key lookup over the top-level mapping, falling back to a nested
/// `metadata:` mapping.
struct Fields<'a> {
    root: &'a Mapping,
    nested: Option<&'a Mapping>,
}

impl<'a> Fields<'a> {
    fn new(root: &'a Mapping) -> Self {
        let nested = root.get("metadata").and_then(Value::as_mapping);
        Self { root, nested }
    }

    fn get(&self, keys: &[&str]) -> Option<&'a Value> {
        let find = |map: &'a Mapping| keys.iter().find_map(|k| map.get(*k));
        find(self.root)
            .filter(|v| !v.is_null())
            .or_else(|| self.nested.and_then(find))
            .filter(|v| !v.is_null())
    }

    fn string(&self, keys: &[&str]) -> Option<String> {
        self.get(keys).and_then(scalar_string)
    }

    fn list(&self, keys: &[&str]) -> Vec<String> {
        match self.get(keys) {
            Some(Value::Sequence(items)) => items.iter().filter_map(scalar_string).collect(),
            Some(other) => scalar_string(other).into_iter().collect(),
            None => Vec::new(),
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_string(&tagged.value),
        _ => None,
    }
}
