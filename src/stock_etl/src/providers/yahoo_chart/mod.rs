//! Yahoo Finance v8 chart endpoint.
//!
//! Public and keyless. One request returns one symbol's bars as parallel
//! arrays (timestamps plus one array per OHLCV field), which
//! [`response`] turns into a [`RawFrame`](crate::models::raw_frame::RawFrame)
//! with `(field, symbol)` column headers.

pub mod params;
pub mod provider;
pub mod response;

pub use provider::{YahooChartProvider, YahooChartSettings};
