//! The single entrypoint: symbols → fetcher → aggregator → sink.
//!
//! A run moves through
//! `Start → Fetching (per symbol) → Aggregating → Persisting → Done`,
//! and stops early only on the fatal outcomes in [`PipelineError`]. A symbol
//! that fails is logged and left out; the remaining symbols still run.

use std::sync::Arc;

use futures::{StreamExt, stream};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    aggregate::{EmptyDataset, SymbolOutcome, combine_with_summary},
    config::EtlConfig,
    errors::Error,
    fetcher::{FetchFailed, Fetcher},
    io::{ArtifactSink, DataSink, S3ObjectStore, SinkError},
    models::{artifact::Artifact, dataset::RunTimestamp},
    providers::{DataProvider, yahoo_chart::YahooChartProvider},
};

/// Outcomes that end a run without an artifact.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    EmptyDataset(#[from] EmptyDataset),

    #[error("Failed to persist dataset: {0}")]
    Persist(#[from] SinkError),

    #[error("Run cancelled")]
    Cancelled,
}

/// What a successful run produced.
#[derive(Debug)]
pub struct RunReport {
    pub artifact: Artifact,
    pub timestamp: RunTimestamp,
    pub rows: usize,
    pub succeeded: Vec<String>,
    pub failed: Vec<FetchFailed>,
}

impl RunReport {
    /// The artifact's filename, for downstream jobs.
    pub fn filename(&self) -> &str {
        &self.artifact.filename
    }
}

pub struct Pipeline {
    symbols: Vec<String>,
    max_concurrency: usize,
    fetcher: Fetcher,
    sink: Arc<dyn DataSink<Output = Artifact>>,
}

impl Pipeline {
    pub fn new(
        config: &EtlConfig,
        provider: Arc<dyn DataProvider>,
        sink: Arc<dyn DataSink<Output = Artifact>>,
    ) -> Self {
        let fetcher = Fetcher::new(provider, config.window_days)
            .with_extrema(config.include_extrema)
            .with_request_timeout(config.request_timeout());
        Self {
            symbols: config.symbols.clone(),
            max_concurrency: config.max_concurrency.max(1),
            fetcher,
            sink,
        }
    }

    /// Runs once, stamping the output with the current local time.
    pub async fn run(&self, cancel: CancellationToken) -> Result<RunReport, PipelineError> {
        self.run_at(RunTimestamp::now(), cancel).await
    }

    /// Runs once with an explicit capture time.
    pub async fn run_at(
        &self,
        timestamp: RunTimestamp,
        cancel: CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        info!(symbols = self.symbols.len(), %timestamp, "starting run");

        let outcomes = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("run cancelled while fetching");
                return Err(PipelineError::Cancelled);
            }
            outcomes = self.fetch_all() => outcomes,
        };

        let (dataset, summary) =
            combine_with_summary(outcomes, timestamp, self.fetcher.include_extrema()).map_err(
                |empty| {
                    error!(attempted = empty.attempted, "no symbol succeeded");
                    PipelineError::from(empty)
                },
            )?;
        info!(
            rows = dataset.len(),
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "aggregated"
        );

        if cancel.is_cancelled() {
            warn!("run cancelled before persisting");
            return Err(PipelineError::Cancelled);
        }

        let artifact = self.sink.write(&dataset).await.map_err(|e| {
            error!(error = %e, "persisting failed");
            PipelineError::from(e)
        })?;
        info!(filename = %artifact.filename, "run complete");

        Ok(RunReport {
            artifact,
            timestamp,
            rows: dataset.len(),
            succeeded: summary.succeeded,
            failed: summary.failed,
        })
    }

    /// Fetches every symbol with bounded concurrency.
    ///
    /// `buffered` yields results in input order whatever the completion
    /// order, so outcomes line up with the symbol list.
    async fn fetch_all(&self) -> Vec<SymbolOutcome> {
        stream::iter(&self.symbols)
            .map(|symbol| self.fetch_one(symbol))
            .buffered(self.max_concurrency)
            .collect()
            .await
    }

    async fn fetch_one(&self, symbol: &str) -> SymbolOutcome {
        debug!(symbol, "fetching");
        let outcome = self.fetcher.fetch(symbol).await;
        match &outcome {
            Ok(history) => info!(symbol, rows = history.len(), "fetched"),
            Err(failure) => warn!(symbol, error = %failure, "skipping symbol"),
        }
        outcome
    }
}

/// Builds the production pipeline for `config` and runs it once.
///
/// Uploads go to S3 when `config.upload` is set; otherwise the artifact stays
/// in `config.output_dir`.
pub async fn run_etl(config: &EtlConfig, cancel: CancellationToken) -> Result<RunReport, Error> {
    config.validate()?;
    let provider = Arc::new(YahooChartProvider::with_settings(&config.yahoo_settings())?);

    let mut sink = ArtifactSink::local(&config.output_dir);
    if let Some(upload) = &config.upload {
        let store = S3ObjectStore::from_config(upload).await;
        sink = sink.with_upload(Arc::new(store), upload.bucket.clone());
    }

    let pipeline = Pipeline::new(config, provider, Arc::new(sink));
    Ok(pipeline.run(cancel).await?)
}

/// Scheduler-facing entrypoint: configuration from the environment, one run,
/// the artifact filename on success.
pub async fn run_scheduled() -> Result<String, Error> {
    let config = EtlConfig::from_env()?;
    let report = run_etl(&config, CancellationToken::new()).await?;
    Ok(report.artifact.filename)
}
