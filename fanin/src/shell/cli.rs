//! # fanin CLI
//!
//! Command-line definition and main entry point.

use crate::{
    config::FanOutConfig,
    fan_out::{self, FanOutReport},
    utils::logging::init_logging,
};
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use fanin_common::OwnerLiveness;
use std::path::PathBuf;

/// fanin: dispatch concurrent tasks and report once every one has finished.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about,
    long_about = "fanin starts N concurrent tasks, each of which sleeps a random delay and then
sets its own completion mark. A single completion listener fires once the last
mark is set.

Settings come from an optional TOML file (--config) and are overridden by flags.
Example: fanin --tasks 32 --max-delay-ms 250 --log-level debug"
)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of concurrent tasks
    #[arg(long)]
    pub tasks: Option<usize>,

    /// Upper bound in milliseconds of each task's random delay
    #[arg(long)]
    pub max_delay_ms: Option<u64>,

    /// Log level used when RUST_LOG is not set (e.g. info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Write logs to a daily rolling file in the user cache directory
    #[arg(long)]
    pub log_to_file: bool,
}

impl Cli {
    /// Merge the optional config file with command-line overrides.
    pub fn resolve_config(&self) -> Result<FanOutConfig> {
        let mut config = match &self.config {
            Some(path) => FanOutConfig::load_from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => FanOutConfig::default(),
        };

        if let Some(tasks) = self.tasks {
            config.tasks = tasks;
        }
        if let Some(max_delay_ms) = self.max_delay_ms {
            config.max_delay_ms = max_delay_ms;
        }
        if let Some(log_level) = &self.log_level {
            config.log_level = log_level.clone();
        }
        if self.log_to_file {
            config.log_to_file = true;
        }

        config.validate()?;
        Ok(config)
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    init_logging(&config.log_level, config.log_to_file)?;
    tracing::info!(
        tasks = config.tasks,
        max_delay_ms = config.max_delay_ms,
        "starting fan-out"
    );

    let report = run_until_interrupted(&config, tokio::signal::ctrl_c()).await?;
    print_report(&report);
    Ok(())
}

/// Run the fan-out unless `interrupt` resolves first.
///
/// On interruption the owner is shut down, so a listener that would fire later
/// does nothing, and an error is returned.
pub async fn run_until_interrupted<I>(config: &FanOutConfig, interrupt: I) -> Result<FanOutReport>
where
    I: Future<Output = std::io::Result<()>>,
{
    let owner = OwnerLiveness::new();
    tokio::select! {
        report = fan_out::run(config, owner.token()) => report,
        signal = interrupt => {
            signal.context("Failed to listen for Ctrl-C")?;
            owner.shut_down();
            tracing::warn!("interrupted before every task reported completion");
            Err(anyhow!("Interrupted before all {} tasks completed", config.tasks))
        }
    }
}

fn print_report(report: &FanOutReport) {
    println!(
        "{} tasks completed in {} ms (completion listener {})",
        report.tasks,
        report.elapsed.as_millis(),
        if report.callback_fired {
            "fired"
        } else {
            "skipped"
        }
    );
}
