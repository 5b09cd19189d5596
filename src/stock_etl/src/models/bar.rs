//! Canonical in-memory representation of one trading day (OHLCV).
//!
//! Every [`DataProvider`](crate::providers::DataProvider) response is mapped
//! into this struct by the [`fetcher`](crate::fetcher), regardless of how the
//! provider lays out its columns.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single daily bar for one symbol.
///
/// This struct is vendor-agnostic and is used throughout the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// The trading day, without a time-of-day component.
    pub date: NaiveDate,

    /// Opening price.
    pub open: f64,

    /// Highest price during the day.
    pub high: f64,

    /// Lowest price during the day.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Shares traded during the day.
    pub volume: u64,
}
