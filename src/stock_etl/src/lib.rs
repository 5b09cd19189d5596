//! Daily price-history ETL.
//!
//! Fetches recent daily bars for a list of symbols, normalizes them into one
//! fixed schema, combines the symbols that succeeded and persists the result
//! as a timestamped CSV artifact, optionally uploaded to S3.
//!
//! [`pipeline::run_scheduled`] is the zero-argument entrypoint for schedulers;
//! [`pipeline::Pipeline`] is the injectable core.

pub mod aggregate;
pub mod config;
pub mod errors;
pub mod fetcher;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod providers;

pub use config::EtlConfig;
pub use errors::Error;
pub use pipeline::{Pipeline, PipelineError, RunReport, run_etl, run_scheduled};
