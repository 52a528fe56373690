//! Shared types, error definitions, and utilities used across all skillpack crates.

pub mod error;
pub mod format;

pub use {
    error::{Error, FromMessage, Result},
    format::OutputFormat,
};
