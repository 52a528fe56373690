//! Process runner for analysis scripts.
//!
//! A script is started through an ordered list of [`LaunchStrategy`]s: the
//! interpreters configured for its extension first, then direct execution
//! when the file is executable. The first strategy that spawns wins. Every
//! failure mode is folded into a [`ProcessOutcome`]; nothing here returns
//! an error.
//!
//! Invocation: `<launcher…> <script> <absolute-target> --output <format>`,
//! stdin closed, stdout and stderr captured in full.

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use {
    async_trait::async_trait,
    skillpack_common::OutputFormat,
    skillpack_config::ChecksConfig,
    skillpack_skills::locate::is_executable,
    tokio::process::Command,
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use skillpack_metrics::{checks as checks_metrics, counter};

/// How one script is run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchStrategy {
    /// Run an interpreter with leading args, then the script path.
    Interpreter { program: String, args: Vec<String> },
    /// Execute the script file itself.
    Direct,
}

impl LaunchStrategy {
    /// Parse a configured candidate such as `"python3"` or `"npx tsx"`.
    fn from_candidate(candidate: &str) -> Option<Self> {
        let mut parts = candidate.split_whitespace();
        let program = parts.next()?.to_string();
        Some(Self::Interpreter {
            program,
            args: parts.map(str::to_string).collect(),
        })
    }

    fn command(&self, script: &Path) -> Result<Command, String> {
        match self {
            Self::Interpreter { program, args } => {
                let resolved =
                    which::which(program).map_err(|e| format!("{program}: {e}"))?;
                let mut cmd = Command::new(resolved);
                cmd.args(args).arg(script);
                Ok(cmd)
            },
            Self::Direct => Ok(Command::new(script)),
        }
    }
}

impl fmt::Display for LaunchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interpreter { program, args } if args.is_empty() => f.write_str(program),
            Self::Interpreter { program, args } => write!(f, "{program} {}", args.join(" ")),
            Self::Direct => f.write_str("direct"),
        }
    }
}

/// Ordered launch candidates for `script`.
pub fn launch_strategies(
    script: &Path,
    interpreters: &BTreeMap<String, Vec<String>>,
) -> Vec<LaunchStrategy> {
    let mut strategies: Vec<LaunchStrategy> = script
        .extension()
        .and_then(|e| e.to_str())
        .and_then(|ext| interpreters.get(&ext.to_ascii_lowercase()))
        .into_iter()
        .flatten()
        .filter_map(|c| LaunchStrategy::from_candidate(c))
        .collect();

    if strategies.is_empty() || is_executable(script) {
        strategies.push(LaunchStrategy::Direct);
    }
    strategies
}

/// Result of one script invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The process started and exited. A non-zero exit code is not a failure:
    /// scripts commonly use it to signal that critical issues were found.
    Success {
        stdout: String,
        stderr: String,
        exit_code: Option<i32>,
    },
    /// No launch strategy could start the process.
    LaunchFailure { reason: String },
    /// The process was killed after running longer than allowed.
    TimedOut { after: Duration },
}

/// Runs one analysis script against a target tree.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, script: &Path, target: &Path, format: OutputFormat) -> ProcessOutcome;
}

/// [`ScriptRunner`] that spawns real child processes.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    interpreters: BTreeMap<String, Vec<String>>,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(interpreters: BTreeMap<String, Vec<String>>, timeout: Option<Duration>) -> Self {
        Self {
            interpreters,
            timeout,
        }
    }

    /// Create from a [`ChecksConfig`].
    pub fn from_config(config: &ChecksConfig) -> Self {
        Self::new(config.interpreters.clone(), config.timeout())
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::from_config(&ChecksConfig::default())
    }
}

#[async_trait]
impl ScriptRunner for ProcessRunner {
    async fn run(&self, script: &Path, target: &Path, format: OutputFormat) -> ProcessOutcome {
        let target = absolute(target);
        let mut failures = Vec::new();

        for strategy in launch_strategies(script, &self.interpreters) {
            let mut cmd = match strategy.command(script) {
                Ok(cmd) => cmd,
                Err(reason) => {
                    debug!(script = %script.display(), %reason, "launch strategy unavailable");
                    failures.push(reason);
                    continue;
                },
            };
            cmd.arg(&target)
                .arg("--output")
                .arg(format.as_str())
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            let child = match cmd.spawn() {
                Ok(child) => child,
                Err(e) => {
                    debug!(script = %script.display(), %strategy, error = %e, "spawn failed");
                    failures.push(format!("{strategy}: {e}"));
                    continue;
                },
            };

            #[cfg(feature = "metrics")]
            counter!(checks_metrics::SCRIPTS_LAUNCHED_TOTAL).increment(1);

            debug!(script = %script.display(), %strategy, target = %target.display(), "spawned analysis script");

            // Dropping the child on timeout kills it (`kill_on_drop`).
            let waited = match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                    Ok(res) => res,
                    Err(_) => {
                        #[cfg(feature = "metrics")]
                        counter!(checks_metrics::TIMEOUTS_TOTAL).increment(1);

                        warn!(script = %script.display(), ?limit, "analysis script timed out");
                        return ProcessOutcome::TimedOut { after: limit };
                    },
                },
                None => child.wait_with_output().await,
            };

            return match waited {
                Ok(output) => {
                    let exit_code = output.status.code();
                    debug!(
                        script = %script.display(),
                        ?exit_code,
                        stdout_len = output.stdout.len(),
                        stderr_len = output.stderr.len(),
                        "analysis script exited"
                    );
                    ProcessOutcome::Success {
                        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                        exit_code,
                    }
                },
                Err(e) => ProcessOutcome::LaunchFailure {
                    reason: format!("{strategy}: failed to collect output: {e}"),
                },
            };
        }

        #[cfg(feature = "metrics")]
        counter!(checks_metrics::LAUNCH_FAILURES_TOTAL).increment(1);

        let reason = if failures.is_empty() {
            "no launch strategy available".to_string()
        } else {
            failures.join("; ")
        };
        warn!(script = %script.display(), %reason, "could not launch analysis script");
        ProcessOutcome::LaunchFailure { reason }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
