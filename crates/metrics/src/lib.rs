//! Metric definitions for skillpack.
//!
//! Recording goes through the `metrics` crate facade. Nothing is exported by
//! default; an embedder that wants the numbers installs its own recorder.
//!
//! ```rust,ignore
//! use skillpack_metrics::{checks, counter};
//!
//! counter!(checks::SCRIPTS_LAUNCHED_TOTAL).increment(1);
//! ```

mod definitions;

pub use definitions::*;

// Re-export metrics macros for convenience
pub use metrics::{counter, histogram};
