use thiserror::Error;

use crate::{config::ConfigError, pipeline::PipelineError, providers::ProviderInitError};

/// The unified error type for the `stock_etl` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The run configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The data provider could not be constructed.
    #[error("Provider error: {0}")]
    ProviderInit(#[from] ProviderInitError),

    /// The run itself failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
