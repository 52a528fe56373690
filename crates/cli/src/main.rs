mod render;
mod report_commands;
mod settings;
mod skill_commands;

use std::{path::PathBuf, process::ExitCode};

use {
    clap::{Parser, Subcommand},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "skillpack", version, about = "Skill catalog browser and analysis-script runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Catalog root directory (overrides config value).
    #[arg(long, global = true, env = "SKILLPACK_ROOT")]
    root: Option<PathBuf>,

    /// Config file to use instead of the discovered one.
    #[arg(long, global = true, env = "SKILLPACK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List skills, grouped by category.
    List {
        /// Only show this category (case-insensitive).
        #[arg(long)]
        category: Option<String>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show a skill's metadata, scripts and guidance.
    Info {
        /// Skill identifier (directory name).
        skill: String,
    },
    /// Run one skill's scripts against a code tree.
    Check(skill_commands::CheckArgs),
    /// Run every skill's scripts against a code tree.
    Report(report_commands::ReportArgs),
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "skillpack starting");

    let verbose = matches!(
        cli.log_level.to_ascii_lowercase().as_str(),
        "debug" | "trace"
    );

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            if verbose {
                eprintln!("error: {e:?}");
            } else {
                eprintln!("error: {e}");
            }
            ExitCode::from(2)
        },
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let settings = Settings::resolve(cli.root, cli.config.as_deref())?;

    match cli.command {
        Commands::List { category, json } => {
            skill_commands::list(&settings, category.as_deref(), json)
        },
        Commands::Info { skill } => skill_commands::info(&settings, &skill),
        Commands::Check(args) => skill_commands::check(&settings, args).await,
        Commands::Report(args) => report_commands::report(settings, args).await,
    }
}
