//! Per-symbol retrieval and normalization.
//!
//! A [`Fetcher`] turns one symbol into a [`SymbolHistory`] or a [`FetchFailed`].
//! It never retries; every failure is reported to the caller, which decides
//! whether the run carries on.

mod extrema;
mod normalize;

pub use extrema::{DailyRange, compute_extrema};
pub use normalize::{daily_ranges, normalize_frame};

use std::{fmt, sync::Arc, time::Duration};

use thiserror::Error;
use tracing::debug;

use crate::{
    models::{
        bar::PriceBar,
        raw_frame::RawFrame,
        symbol_history::{ExtremaStatus, SymbolHistory},
        window::HistoryRequest,
    },
    providers::{DataProvider, ProviderError},
};

/// Why a symbol could not be fetched. None of these are fatal to a run.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("symbol is blank")]
    BlankSymbol,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("provider did not answer within {0:?}")]
    Timeout(Duration),

    #[error("provider returned no rows")]
    Empty,

    #[error("required column `{column}` is missing")]
    MissingColumn { column: &'static str },

    #[error("row {row} is invalid: {reason}")]
    InvalidRow { row: usize, reason: String },
}

/// Which of the two provider calls failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Window,
    Extrema,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStage::Window => f.write_str("recent window"),
            FetchStage::Extrema => f.write_str("full history"),
        }
    }
}

#[derive(Debug, Error)]
#[error("fetching {stage} for {symbol} failed: {reason}")]
pub struct FetchFailed {
    pub symbol: String,
    pub stage: FetchStage,
    pub reason: FetchFailure,
}

impl FetchFailed {
    fn new(symbol: &str, stage: FetchStage, reason: FetchFailure) -> Self {
        Self {
            symbol: symbol.to_string(),
            stage,
            reason,
        }
    }
}

pub struct Fetcher {
    provider: Arc<dyn DataProvider>,
    window_days: u32,
    include_extrema: bool,
    request_timeout: Duration,
}

impl Fetcher {
    pub fn new(provider: Arc<dyn DataProvider>, window_days: u32) -> Self {
        Self {
            provider,
            window_days,
            include_extrema: false,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Also look up each symbol's full history for all-time extrema.
    pub fn with_extrema(mut self, include_extrema: bool) -> Self {
        self.include_extrema = include_extrema;
        self
    }

    /// Upper bound on each provider call.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn include_extrema(&self) -> bool {
        self.include_extrema
    }

    /// Fetches the recent window for `symbol` and, if enabled, its extrema.
    ///
    /// An empty recent window fails the symbol. An empty full history does
    /// not: the bars are kept and the extrema are marked unavailable. The full
    /// history is read leniently, so a gap in old data only drops that day.
    pub async fn fetch(&self, symbol: &str) -> Result<SymbolHistory, FetchFailed> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(FetchFailed::new(
                symbol,
                FetchStage::Window,
                FetchFailure::BlankSymbol,
            ));
        }

        let bars = self
            .fetch_bars(HistoryRequest::trailing(symbol, self.window_days))
            .await
            .and_then(|bars| {
                if bars.is_empty() {
                    Err(FetchFailure::Empty)
                } else {
                    Ok(bars)
                }
            })
            .map_err(|reason| FetchFailed::new(symbol, FetchStage::Window, reason))?;

        let extrema = if self.include_extrema {
            let history = self
                .fetch_frame(HistoryRequest::max(symbol))
                .await
                .and_then(daily_ranges)
                .map_err(|reason| FetchFailed::new(symbol, FetchStage::Extrema, reason))?;
            match compute_extrema(&history) {
                Some(extrema) => ExtremaStatus::Available(extrema),
                None => {
                    debug!(symbol, "full history is empty, extrema unavailable");
                    ExtremaStatus::Unavailable
                }
            }
        } else {
            ExtremaStatus::NotRequested
        };

        Ok(SymbolHistory {
            symbol: symbol.to_string(),
            bars,
            extrema,
        })
    }

    async fn fetch_bars(&self, request: HistoryRequest) -> Result<Vec<PriceBar>, FetchFailure> {
        self.fetch_frame(request).await.and_then(normalize_frame)
    }

    async fn fetch_frame(&self, request: HistoryRequest) -> Result<RawFrame, FetchFailure> {
        let frame = tokio::time::timeout(
            self.request_timeout,
            self.provider.fetch_history(&request),
        )
        .await
        .map_err(|_| FetchFailure::Timeout(self.request_timeout))??;
        debug!(symbol = %request.symbol, rows = frame.height(), "provider answered");
        Ok(frame)
    }
}
