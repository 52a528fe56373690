//! Configuration loading and env substitution.
//!
//! Config files: `skillpack.toml`, `skillpack.yaml`, `skillpack.yml` or
//! `skillpack.json`, searched in `./` then `~/.config/skillpack/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution in the raw
//! file before it is parsed.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{config_dir, discover_and_load, load_config},
    schema::{CatalogConfig, ChecksConfig, SkillpackConfig},
};
