//! fxvar - USD/GTQ rate acquisition and next-day P&L risk forecasting
//!
//! # Usage
//! ```sh
//! fxvar download --start 2020-01-01 --end 2026-02-22
//! fxvar features
//! fxvar train
//! fxvar run
//! ```
//!
//! Configuration comes from the environment (optionally `.env`); see
//! `Config::from_env`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use fxvar::application::acquisition::RateDownloader;
use fxvar::application::pipeline::{run_feature_stage, run_model_stage, run_snapshot_stage};
use fxvar::config::Config;
use fxvar::infrastructure::banguat::ReqwestSoapTransport;
use fxvar::infrastructure::observability::PipelineMetrics;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download the rate history and write the raw and processed snapshots
    Download {
        /// First date, YYYY-MM-DD (default: DOWNLOAD_START_DATE)
        #[arg(long)]
        start: Option<String>,
        /// Last date, YYYY-MM-DD (default: DOWNLOAD_END_DATE or today)
        #[arg(long)]
        end: Option<String>,
    },
    /// Build the feature table from the raw snapshot
    Features,
    /// Split, fit the models and write metrics
    Train,
    /// Download, build features and train in one go
    Run {
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    info!("fxvar {} starting ({:?})", env!("CARGO_PKG_VERSION"), cli.command);

    let metrics = PipelineMetrics::new()?;
    let transport = ReqwestSoapTransport::new(
        config.soap.endpoint.clone(),
        config.soap.schema.soap_action.clone(),
        config.soap.timeout,
    );
    let downloader = RateDownloader::from_config(transport, &config.soap).with_metrics(metrics.clone());

    let (download, features, train, start, end) = match cli.command {
        Command::Download { start, end } => (true, false, false, start, end),
        Command::Features => (false, true, false, None, None),
        Command::Train => (false, false, true, None, None),
        Command::Run { start, end } => (true, true, true, start, end),
    };

    if download {
        let start = start.unwrap_or_else(|| config.soap.start_date.clone());
        let end = end.unwrap_or_else(|| config.soap.end_date.clone());
        let summary = run_snapshot_stage(&downloader, &config.paths, &start, &end).await?;
        println!("{}", summary.status_line());
    }

    if features {
        let summary = run_feature_stage(&config.paths, &config.features, Some(&metrics))?;
        println!("{}", summary.status_line());
    }

    if train {
        let report = run_model_stage(&config.paths, &config.features, &config.model)?;
        println!("{}", report.status_line());
    }

    if config.observability.enabled {
        print!("{}", metrics.render());
    }

    Ok(())
}
