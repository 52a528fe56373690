//! `report`: run the whole catalog and render the result.

use std::{path::PathBuf, process::ExitCode};

use {
    anyhow::Context,
    clap::Args,
    skillpack_checks::Aggregator,
    skillpack_common::OutputFormat,
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use crate::{render, settings::Settings};

#[derive(Args)]
pub struct ReportArgs {
    /// Code tree to analyze.
    #[arg(long)]
    pub path: PathBuf,
    /// Also write the JSON report document to this file.
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Rendering on stdout.
    #[arg(long, default_value = "console")]
    pub format: OutputFormat,
    /// Maximum number of scripts running at once (overrides config value).
    #[arg(long)]
    pub concurrency: Option<usize>,
    /// Per-script timeout in seconds, 0 to disable (overrides config value).
    #[arg(long)]
    pub timeout: Option<u64>,
}

pub async fn report(mut settings: Settings, args: ReportArgs) -> anyhow::Result<ExitCode> {
    if let Some(n) = args.concurrency {
        settings.checks.concurrency = Some(n);
    }
    if let Some(secs) = args.timeout {
        settings.checks.timeout_secs = secs;
    }

    let catalog = settings.open_catalog()?;
    let aggregator = Aggregator::from_config(catalog, &settings.checks);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, waiting for running scripts");
            on_interrupt.cancel();
        }
    });

    let report = aggregator.build_report(&args.path, &cancel).await?;

    if let Some(ref path) = args.output {
        let doc = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, doc)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }

    print!("{}", render::report(&report, args.format)?);

    Ok(if report.has_critical() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}
