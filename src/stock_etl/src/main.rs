use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use stock_etl::{EtlConfig, config::CONFIG_PATH_ENV, run_etl};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Fetch daily stock bars and persist them as one CSV artifact")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, value_name = "FILE", env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    /// Directory the CSV artifact is written to
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Comma-separated symbols (e.g. "AAPL,MSFT"), replacing the configured list
    #[arg(long, value_delimiter = ',')]
    symbols: Option<Vec<String>>,

    /// Trailing calendar days to fetch
    #[arg(long)]
    window_days: Option<u32>,

    /// Symbols fetched at the same time
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Skip the all-time high/low columns
    #[arg(long)]
    no_extrema: bool,

    /// Keep the artifact locally even when an upload bucket is configured
    #[arg(long)]
    no_upload: bool,
}

impl Cli {
    fn into_config(self) -> Result<EtlConfig> {
        let mut config = match &self.config {
            Some(path) => EtlConfig::load(path)?,
            None => EtlConfig::default(),
        };
        config.apply_env_overrides()?;

        if let Some(symbols) = self.symbols {
            config.symbols = symbols;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(days) = self.window_days {
            config.window_days = days;
        }
        if let Some(n) = self.max_concurrency {
            config.max_concurrency = n;
        }
        if self.no_extrema {
            config.include_extrema = false;
        }
        if self.no_upload {
            config.upload = None;
        }

        config.normalize();
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().into_config()?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling run");
            on_signal.cancel();
        }
    });

    let report = run_etl(&config, cancel).await.context("ETL run failed")?;

    println!("{}", report.filename());
    eprintln!(
        "SUMMARY: {} rows, {} symbols ok, {} failed{}",
        report.rows,
        report.succeeded.len(),
        report.failed.len(),
        report
            .artifact
            .remote
            .as_ref()
            .map(|remote| format!(", uploaded to {}", remote.uri()))
            .unwrap_or_default(),
    );
    for failure in &report.failed {
        eprintln!("  skipped {failure}");
    }

    Ok(())
}
