//! Request parameters understood by every [`DataProvider`](crate::providers::DataProvider).

use serde::{Deserialize, Serialize};

/// The span of history to request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryRange {
    /// The trailing `days` calendar days up to now.
    Trailing { days: u32 },
    /// Everything the provider has for the symbol.
    Max,
}

/// Bar granularity. Only daily bars are produced by this pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    #[default]
    Daily,
}

/// Universal parameters for requesting one symbol's bar history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRequest {
    /// The symbol to request (e.g., `"AAPL"`).
    pub symbol: String,

    /// How far back to go.
    pub range: HistoryRange,

    /// The time interval for each bar.
    #[serde(default)]
    pub interval: Interval,
}

impl HistoryRequest {
    /// Daily bars over the trailing `days` calendar days.
    pub fn trailing(symbol: impl Into<String>, days: u32) -> Self {
        Self {
            symbol: symbol.into(),
            range: HistoryRange::Trailing { days },
            interval: Interval::Daily,
        }
    }

    /// Daily bars over the symbol's whole available history.
    pub fn max(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            range: HistoryRange::Max,
            interval: Interval::Daily,
        }
    }
}
