//! `list`, `info` and `check`.

use std::{path::PathBuf, process::ExitCode};

use {
    clap::Args,
    skillpack_checks::{Aggregator, ProcessOutcome, Severity, SkillCheck},
    skillpack_common::OutputFormat,
    tracing::warn,
};

use crate::{render, settings::Settings};

#[derive(Args)]
pub struct CheckArgs {
    /// Skill identifier (directory name).
    pub skill: String,
    /// Code tree to analyze.
    #[arg(long)]
    pub path: PathBuf,
    /// Output shape requested from the scripts.
    #[arg(long, default_value = "console")]
    pub output: OutputFormat,
}

pub fn list(settings: &Settings, category: Option<&str>, json: bool) -> anyhow::Result<ExitCode> {
    let catalog = settings.open_catalog()?;
    let skills = catalog.list_skills(category)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&skills)?);
        return Ok(ExitCode::SUCCESS);
    }

    let mut rows = Vec::with_capacity(skills.len());
    for skill in skills {
        let scripts = catalog.find_scripts(&skill.id)?.scripts().len();
        rows.push((skill, scripts));
    }
    print!("{}", render::skill_list(&rows));
    Ok(ExitCode::SUCCESS)
}

pub fn info(settings: &Settings, skill: &str) -> anyhow::Result<ExitCode> {
    let catalog = settings.open_catalog()?;
    let Some(content) = catalog.load_skill(skill)? else {
        eprintln!("skill not found: {skill}");
        return Ok(ExitCode::SUCCESS);
    };
    let lookup = catalog.find_scripts(skill)?;
    print!("{}", render::skill_info(&content, lookup.scripts()));
    Ok(ExitCode::SUCCESS)
}

pub async fn check(settings: &Settings, args: CheckArgs) -> anyhow::Result<ExitCode> {
    let catalog = settings.open_catalog()?;
    let aggregator = Aggregator::from_config(catalog, &settings.checks);

    let check = aggregator
        .check_skill(&args.skill, &args.path, args.output)
        .await?;
    let outputs = match &check {
        SkillCheck::Ran { outputs, .. } if !outputs.is_empty() => outputs,
        SkillCheck::Ran { .. } | SkillCheck::NotFound => {
            eprintln!("no scripts for this skill: {}", args.skill);
            return Ok(ExitCode::SUCCESS);
        },
    };

    if args.output == OutputFormat::Json {
        let Some(result) = check.to_result(&args.skill) else {
            return Ok(ExitCode::SUCCESS);
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(if result.count(Severity::Critical) > 0 {
            ExitCode::from(1)
        } else {
            ExitCode::SUCCESS
        });
    }

    // Console and markdown output belongs to the script; pass it through.
    for output in outputs {
        match &output.outcome {
            ProcessOutcome::Success { stdout, .. } => print!("{stdout}"),
            ProcessOutcome::LaunchFailure { reason } => {
                warn!(script = %output.script.display(), %reason, "script did not run");
            },
            ProcessOutcome::TimedOut { after } => {
                warn!(script = %output.script.display(), ?after, "script timed out");
            },
        }
    }
    Ok(ExitCode::SUCCESS)
}
