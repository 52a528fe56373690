//! Skill catalog: discovery, metadata parsing, and script location.
//!
//! A catalog is a directory of categories, each holding skill directories.
//! Every skill directory carries a `SKILL.md` file with YAML frontmatter and
//! markdown guidance, plus an optional `scripts/` directory of analysis
//! programs:
//!
//! ```text
//! <root>/<category>/<skill>/SKILL.md
//! <root>/<category>/<skill>/scripts/*
//! <root>/<category>/<skill>/references/*   (ignored)
//! ```

pub mod discover;
pub mod error;
pub mod locate;
pub mod parse;
pub mod types;

pub use {
    discover::{Catalog, DEFAULT_DEFINITION_FILE, list_skills},
    error::{Error, Result},
    locate::{ScriptLookup, ScriptSet, find_scripts},
    types::{Category, Priority, SkillContent, SkillEntry},
};
