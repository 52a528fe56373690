//! Running a catalog's analysis scripts against a code tree.
//!
//! [`runner`] launches one script and captures its output, [`parse`] decodes
//! the JSON it prints, and [`aggregate`] fans out over every skill of a
//! catalog and folds the findings into a [`Report`].

pub mod aggregate;
pub mod parse;
pub mod runner;
pub mod types;

pub use {
    aggregate::{Aggregator, ScriptOutput, SkillCheck},
    parse::{ParsedOutput, parse_output},
    runner::{LaunchStrategy, ProcessOutcome, ProcessRunner, ScriptRunner},
    types::{Finding, Report, ScriptRun, ScriptStatus, Severity, SkillCheckResult, Summary},
};
