//! `job-scraper` command line entry point
//!
//! Usage: `job-scraper [CONFIG_PATH]`. Without a path the per-user config file
//! is used, and written with defaults on first run.

use anyhow::Context;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use job_scraper_lib::infrastructure::{
    ConfigManager, HttpChallengeClient, init_logging_with_config,
};
use job_scraper_lib::{JobScraper, RunOutcome, ScraperSettings};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let explicit_path = std::env::args().nth(1);
    let manager = match &explicit_path {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let first_run = explicit_path.is_none() && !manager.config_path().exists();

    // Logging settings live in the config, so nothing is logged before this point
    let app_config = if explicit_path.is_some() {
        manager.load_config()?
    } else {
        manager.initialize_on_first_run().await?
    };

    init_logging_with_config(&app_config.logging)?;
    info!("🚀 job-scraper {} starting", env!("CARGO_PKG_VERSION"));
    if first_run {
        info!("🎉 First run: wrote default configuration to {:?}", manager.config_path());
    }
    info!("⚙️ Configuration loaded from {:?}", manager.config_path());

    let client = Arc::new(
        HttpChallengeClient::new(&app_config.challenge).context("Failed to build challenge client")?,
    );
    let scraper = JobScraper::new(client, ScraperSettings::from(&app_config))
        .context("Failed to build job list parser")?;

    let cancellation_token = scraper.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Ctrl-C received, cancelling run");
            cancellation_token.cancel();
        }
    });

    let outcome = scraper.run().await?;
    match &outcome {
        RunOutcome::Completed { run_id, acknowledged: true } => {
            info!("🎉 Run {} completed", run_id);
            println!("Challenge complete (run {run_id}).");
        }
        RunOutcome::Completed { run_id, acknowledged: false } => {
            error!("Run {} finished but completion was refused", run_id);
            println!("Challenge completion was not acknowledged (run {run_id}).");
        }
        RunOutcome::Incomplete(report) => {
            println!("{report}");
        }
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
