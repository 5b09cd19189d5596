//! Provider abstraction for market data sources.
//!
//! This module defines the [`DataProvider`] trait, which serves as a unified interface
//! for fetching one symbol's daily bar history from any market data vendor.
//!
//! A provider returns the vendor's table as a [`RawFrame`] without interpreting it;
//! mapping that table onto the canonical [`PriceBar`](crate::models::bar::PriceBar)
//! schema is the job of the [`fetcher`](crate::fetcher).
//!
//! The trait is designed for async usage and supports dynamic dispatch (`dyn DataProvider`)
//! for runtime selection of providers.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use stock_etl::models::{raw_frame::RawFrame, window::HistoryRequest};
//! use stock_etl::providers::{DataProvider, ProviderError};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl DataProvider for MyProvider {
//!     async fn fetch_history(
//!         &self,
//!         _request: &HistoryRequest,
//!     ) -> Result<RawFrame, ProviderError> {
//!         Ok(RawFrame::default())
//!     }
//! }
//! ```
//!

pub mod yahoo_chart;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::models::{raw_frame::RawFrame, window::HistoryRequest};

/// Trait for fetching daily bar history from a market data provider.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetches the bars covered by `request` for a single symbol.
    ///
    /// # Returns
    ///
    /// * `Ok(RawFrame)` - The provider's table. An empty frame means the provider
    ///   answered but had no data; it is not an error at this layer.
    /// * `Err(ProviderError)` - Transport, API, or decoding failure.
    async fn fetch_history(&self, request: &HistoryRequest) -> Result<RawFrame, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// A configured header value contains invalid characters.
    #[snafu(display("Invalid header value for {name}: {source}"))]
    InvalidHeader {
        name: &'static str,
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },

    /// The configured base URL cannot be used.
    #[snafu(display("Invalid base URL {url:?}: {message}"))]
    InvalidBaseUrl {
        url: String,
        message: String,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `DataProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider's API returned a specific error message (e.g., unknown symbol).
    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        backtrace: Backtrace,
    },

    /// The response body did not have the expected shape.
    #[snafu(display("Malformed provider response: {message}"))]
    Decode {
        message: String,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this specific provider.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },
}
