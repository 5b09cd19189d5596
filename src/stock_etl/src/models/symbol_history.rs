//! The per-symbol result of a successful fetch.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::bar::PriceBar;

/// All-time highest and lowest observed prices and the days they occurred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extrema {
    pub all_time_high: f64,
    pub all_time_high_date: NaiveDate,
    pub all_time_low: f64,
    pub all_time_low_date: NaiveDate,
}

/// Whether extrema were computed for a symbol.
///
/// `Unavailable` and `NotRequested` are different: the former still occupies
/// the extrema columns of the output (as nulls), the latter means the run was
/// configured without extrema and the columns are absent altogether.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ExtremaStatus {
    #[default]
    NotRequested,
    Unavailable,
    Available(Extrema),
}

impl ExtremaStatus {
    pub fn extrema(&self) -> Option<&Extrema> {
        match self {
            ExtremaStatus::Available(extrema) => Some(extrema),
            _ => None,
        }
    }
}

/// Represents the recent daily history of a single symbol.
///
/// Bars are chronological with strictly increasing dates, one per trading
/// day in the requested window.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolHistory {
    /// The symbol this data represents (e.g., "AAPL").
    pub symbol: String,
    /// The collection of daily bars.
    pub bars: Vec<PriceBar>,
    /// All-time extrema, when requested.
    pub extrema: ExtremaStatus,
}

impl SymbolHistory {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
