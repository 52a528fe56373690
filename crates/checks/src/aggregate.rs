//! Report aggregation over a whole catalog.
//!
//! Every (skill, script) pair is an independent unit: run the script, parse
//! its output, keep the findings. Units run concurrently up to a bound and
//! their results are merged at the end, ordered by (category, skill) and
//! then by script order, so completion order never shows in the report.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use {
    futures::{StreamExt, stream},
    skillpack_common::OutputFormat,
    skillpack_config::ChecksConfig,
    skillpack_skills::{Catalog, Result, ScriptLookup, SkillEntry},
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use skillpack_metrics::{checks as checks_metrics, counter, histogram, labels};

use crate::{
    parse::{ParsedOutput, parse_output},
    runner::{ProcessOutcome, ProcessRunner, ScriptRunner},
    types::{Finding, Report, ScriptRun, ScriptStatus, SkillCheckResult},
};

/// Output of one script run for a single-skill check.
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    pub script: PathBuf,
    pub outcome: ProcessOutcome,
}

/// Result of running every script of one skill.
#[derive(Debug, Clone)]
pub enum SkillCheck {
    /// No category has a skill with that identifier.
    NotFound,
    /// The skill was resolved; `outputs` is empty when it has no scripts.
    Ran {
        category: String,
        outputs: Vec<ScriptOutput>,
    },
}

impl SkillCheck {
    /// Fold JSON outputs into a result the same way a report does.
    pub fn to_result(&self, skill_id: &str) -> Option<SkillCheckResult> {
        let Self::Ran { category, outputs } = self else {
            return None;
        };
        let mut result = SkillCheckResult::new(skill_id, category.as_str());
        for output in outputs {
            let (run, findings) = interpret(&output.script, output.outcome.clone());
            result.record(run, findings);
        }
        Some(result)
    }
}

/// Runs a catalog's scripts against a target and builds the [`Report`].
pub struct Aggregator {
    catalog: Catalog,
    runner: Arc<dyn ScriptRunner>,
    concurrency: usize,
}

struct Unit {
    skill_idx: usize,
    script_idx: usize,
    script: PathBuf,
}

struct UnitResult {
    skill_idx: usize,
    script_idx: usize,
    run: ScriptRun,
    findings: Vec<Finding>,
}

impl Aggregator {
    pub fn new(catalog: Catalog, runner: Arc<dyn ScriptRunner>) -> Self {
        Self {
            catalog,
            runner,
            concurrency: ChecksConfig::default().effective_concurrency(),
        }
    }

    /// Build with a [`ProcessRunner`] and the concurrency limit from `config`.
    pub fn from_config(catalog: Catalog, config: &ChecksConfig) -> Self {
        Self::new(catalog, Arc::new(ProcessRunner::from_config(config)))
            .with_concurrency(config.effective_concurrency())
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Run every script of every skill against `target`.
    ///
    /// Only a missing catalog root is an error. Script failures become
    /// per-script statuses with zero findings. Skills without scripts are
    /// left out of the report. Once `cancel` fires, units that have not
    /// started are skipped, started ones finish, and the report is flagged
    /// as cancelled.
    pub async fn build_report(&self, target: &Path, cancel: &CancellationToken) -> Result<Report> {
        let started = Instant::now();
        let plans = self.plan()?;
        let target = std::path::absolute(target).unwrap_or_else(|_| target.to_path_buf());

        let units: Vec<Unit> = plans
            .iter()
            .enumerate()
            .flat_map(|(skill_idx, (_, scripts))| {
                scripts
                    .iter()
                    .enumerate()
                    .map(move |(script_idx, script)| Unit {
                        skill_idx,
                        script_idx,
                        script: script.clone(),
                    })
            })
            .collect();
        let unit_count = units.len();
        debug!(skills = plans.len(), units = unit_count, concurrency = self.concurrency, "starting checks");

        let runner = self.runner.as_ref();
        let target_ref = target.as_path();
        let mut completed: Vec<UnitResult> = stream::iter(units)
            .map(|unit| async move {
                if cancel.is_cancelled() {
                    return None;
                }
                Some(run_unit(runner, unit, target_ref).await)
            })
            .buffer_unordered(self.concurrency)
            .filter_map(|res| async move { res })
            .collect()
            .await;

        // Merge: restore (skill, script) order regardless of completion order.
        completed.sort_by_key(|u| (u.skill_idx, u.script_idx));

        let mut slots: Vec<Option<SkillCheckResult>> = plans.iter().map(|_| None).collect();
        for unit in completed {
            let (entry, _) = &plans[unit.skill_idx];
            slots[unit.skill_idx]
                .get_or_insert_with(|| SkillCheckResult::new(&entry.id, &entry.category))
                .record(unit.run, unit.findings);
        }
        let mut results: Vec<SkillCheckResult> = slots.into_iter().flatten().collect();
        results.sort_by(|a, b| (&a.category, &a.skill).cmp(&(&b.category, &b.skill)));

        let cancelled = cancel.is_cancelled();
        if cancelled {
            warn!("run cancelled, report covers only the checks that were started");
        }

        let report = Report::new(target.display().to_string(), results).cancelled(cancelled);
        info!(
            skills = report.summary().total_skills_checked,
            issues = report.summary().total_issues,
            critical = report.summary().critical_issues,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "checks finished"
        );
        Ok(report)
    }

    /// Run every script of one skill with the requested output shape.
    ///
    /// Scripts run one after another, in name order.
    pub async fn check_skill(
        &self,
        skill_id: &str,
        target: &Path,
        format: OutputFormat,
    ) -> Result<SkillCheck> {
        let set = match self.catalog.find_scripts(skill_id)? {
            ScriptLookup::NotFound => return Ok(SkillCheck::NotFound),
            ScriptLookup::Found(set) => set,
        };

        let mut outputs = Vec::with_capacity(set.scripts.len());
        for script in set.scripts {
            let outcome = self.runner.run(&script, target, format).await;
            outputs.push(ScriptOutput { script, outcome });
        }
        Ok(SkillCheck::Ran {
            category: set.category,
            outputs,
        })
    }

    /// Skills with at least one script, in catalog order.
    fn plan(&self) -> Result<Vec<(SkillEntry, Vec<PathBuf>)>> {
        let mut plans = Vec::new();
        for entry in self.catalog.list_skills(None)? {
            let lookup = match self.catalog.find_scripts(&entry.id) {
                Ok(lookup) => lookup,
                Err(e @ skillpack_skills::Error::CatalogNotFound { .. }) => return Err(e),
                Err(e) => {
                    warn!(skill = %entry.id, error = %e, "skipping skill, scripts could not be resolved");
                    continue;
                },
            };
            match lookup {
                ScriptLookup::Found(set) if !set.scripts.is_empty() => {
                    plans.push((entry, set.scripts));
                },
                ScriptLookup::Found(_) => {
                    debug!(skill = %entry.id, "skill has no scripts");
                },
                ScriptLookup::NotFound => {
                    debug!(skill = %entry.id, "no scripts for this skill");
                },
            }
        }
        Ok(plans)
    }
}

async fn run_unit(runner: &dyn ScriptRunner, unit: Unit, target: &Path) -> UnitResult {
    let started = Instant::now();
    let outcome = runner.run(&unit.script, target, OutputFormat::Json).await;
    let (run, findings) = interpret(&unit.script, outcome);

    #[cfg(feature = "metrics")]
    {
        histogram!(checks_metrics::SCRIPT_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        for finding in &findings {
            counter!(
                checks_metrics::FINDINGS_TOTAL,
                labels::SEVERITY => finding.severity.as_str()
            )
            .increment(1);
        }
    }

    debug!(
        script = %unit.script.display(),
        status = ?run.status,
        findings = run.findings,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "script finished"
    );

    UnitResult {
        skill_idx: unit.skill_idx,
        script_idx: unit.script_idx,
        run,
        findings,
    }
}

/// Turn a process outcome into a per-script record plus its findings.
fn interpret(script: &Path, outcome: ProcessOutcome) -> (ScriptRun, Vec<Finding>) {
    let name = script
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| script.display().to_string());

    let (status, exit_code, detail, findings) = match outcome {
        ProcessOutcome::Success {
            stdout,
            stderr,
            exit_code,
        } => match parse_output(&stdout) {
            ParsedOutput::Findings(findings) => (ScriptStatus::Ok, exit_code, None, findings),
            ParsedOutput::Empty => {
                let detail = (!stderr.trim().is_empty()).then(|| last_line(&stderr));
                (ScriptStatus::Empty, exit_code, detail, Vec::new())
            },
            ParsedOutput::Unparseable { reason } => {
                #[cfg(feature = "metrics")]
                counter!(checks_metrics::UNPARSEABLE_OUTPUT_TOTAL).increment(1);

                warn!(script = %script.display(), %reason, "script output is not a findings document");
                (ScriptStatus::Unparseable, exit_code, Some(reason), Vec::new())
            },
        },
        ProcessOutcome::LaunchFailure { reason } => {
            (ScriptStatus::LaunchFailed, None, Some(reason), Vec::new())
        },
        ProcessOutcome::TimedOut { after } => (
            ScriptStatus::TimedOut,
            None,
            Some(format!("timed out after {}s", after.as_secs_f64())),
            Vec::new(),
        ),
    };

    let run = ScriptRun {
        script: name,
        status,
        findings: findings.len(),
        exit_code,
        detail,
    };
    (run, findings)
}

fn last_line(text: &str) -> String {
    text.trim().lines().last().unwrap_or_default().trim().to_string()
}
