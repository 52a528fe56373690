//! Metric name and label definitions.
//!
//! Every metric skillpack records is named here so the set stays documented
//! in one place.

/// Catalog reader metrics
pub mod catalog {
    /// Skills discovered by a catalog walk
    pub const SKILLS_DISCOVERED_TOTAL: &str = "skillpack_catalog_skills_discovered_total";
    /// Skill entries skipped because their definition could not be parsed
    pub const PARSE_ERRORS_TOTAL: &str = "skillpack_catalog_parse_errors_total";
}

/// Analysis script metrics
pub mod checks {
    /// Scripts started
    pub const SCRIPTS_LAUNCHED_TOTAL: &str = "skillpack_checks_scripts_launched_total";
    /// Scripts that could not be started with any launch strategy
    pub const LAUNCH_FAILURES_TOTAL: &str = "skillpack_checks_launch_failures_total";
    /// Scripts killed after exceeding the timeout
    pub const TIMEOUTS_TOTAL: &str = "skillpack_checks_timeouts_total";
    /// Scripts whose stdout could not be decoded
    pub const UNPARSEABLE_OUTPUT_TOTAL: &str = "skillpack_checks_unparseable_output_total";
    /// Findings collected, labelled by severity
    pub const FINDINGS_TOTAL: &str = "skillpack_checks_findings_total";
    /// Wall-clock duration of one script run in seconds
    pub const SCRIPT_DURATION_SECONDS: &str = "skillpack_checks_script_duration_seconds";
}

/// Common label keys
pub mod labels {
    pub const SEVERITY: &str = "severity";
}
