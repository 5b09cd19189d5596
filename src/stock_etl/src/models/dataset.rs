//! The combined, run-stamped output of one pipeline run.

use std::{fmt, str::FromStr};

use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Serialize, Serializer};

use crate::models::{bar::PriceBar, symbol_history::Extrema};

/// Format shared by the `timestamp` column and the artifact filename.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Output columns present in every dataset, in order, minus the trailing
/// `timestamp`.
pub const BAR_COLUMNS: [&str; 7] = ["ticker", "date", "open", "high", "low", "close", "volume"];

/// Columns inserted before `timestamp` when extrema are enabled.
pub const EXTREMA_COLUMNS: [&str; 4] = [
    "all_time_high",
    "all_time_high_date",
    "all_time_low",
    "all_time_low_date",
];

pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Wall-clock capture time of a run, at second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunTimestamp(NaiveDateTime);

impl RunTimestamp {
    /// Captures the local time now.
    pub fn now() -> Self {
        Self::from_datetime(Local::now().naive_local())
    }

    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        Self(datetime.trunc_subsecs(0))
    }

    pub fn as_datetime(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for RunTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl FromStr for RunTimestamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).map(Self)
    }
}

impl Serialize for RunTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One output row: a symbol's bar plus run-level annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub ticker: String,
    pub bar: PriceBar,
    /// `None` when extrema were requested but unavailable, or not requested.
    pub extrema: Option<Extrema>,
    pub timestamp: RunTimestamp,
}

/// Rows from every successful symbol, grouped by symbol in list order and
/// chronological within a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    timestamp: RunTimestamp,
    include_extrema: bool,
    rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn new(timestamp: RunTimestamp, include_extrema: bool, rows: Vec<DatasetRow>) -> Self {
        Self {
            timestamp,
            include_extrema,
            rows,
        }
    }

    pub fn timestamp(&self) -> RunTimestamp {
        self.timestamp
    }

    /// Whether the extrema columns are part of this dataset's schema.
    pub fn include_extrema(&self) -> bool {
        self.include_extrema
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct tickers in row order.
    pub fn symbols(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for row in &self.rows {
            if out.last() != Some(&row.ticker.as_str()) {
                out.push(&row.ticker);
            }
        }
        out
    }

    /// The fixed column order of this dataset.
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns = BAR_COLUMNS.to_vec();
        if self.include_extrema {
            columns.extend(EXTREMA_COLUMNS);
        }
        columns.push(TIMESTAMP_COLUMN);
        columns
    }
}
