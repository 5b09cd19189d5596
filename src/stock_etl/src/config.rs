//! Run configuration: TOML file, environment overrides, validation.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration that fetches the default symbol list without uploading.
//!
//! ```toml
//! symbols = ["AAPL", "MSFT"]
//! window_days = 30
//! include_extrema = true
//! output_dir = "/var/lib/stock_etl"
//!
//! [upload]
//! bucket = "market-data-daily"
//! region = "us-east-1"
//! ```

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use shared_utils::env::{EnvVarError, get_env_var_opt, parse_env_var};
use thiserror::Error;

use crate::providers::yahoo_chart::{
    YahooChartSettings,
    provider::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT},
};

/// Path of the config file used by [`EtlConfig::from_env`].
pub const CONFIG_PATH_ENV: &str = "STOCK_ETL_CONFIG";
/// Comma-separated symbol list replacing `symbols`.
pub const SYMBOLS_ENV: &str = "STOCK_ETL_SYMBOLS";
pub const OUTPUT_DIR_ENV: &str = "STOCK_ETL_OUTPUT_DIR";
pub const WINDOW_DAYS_ENV: &str = "STOCK_ETL_WINDOW_DAYS";
/// `true` or `false`.
pub const INCLUDE_EXTREMA_ENV: &str = "STOCK_ETL_INCLUDE_EXTREMA";
/// Enables upload to this bucket, keeping any other `[upload]` settings.
pub const BUCKET_ENV: &str = "STOCK_ETL_BUCKET";

pub const DEFAULT_SYMBOLS: [&str; 10] = [
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "META", "NVDA", "NFLX", "INTC", "PYPL",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Env(#[from] EnvVarError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EtlConfig {
    /// Symbols in output order.
    pub symbols: Vec<String>,
    /// Trailing calendar days of daily bars per run.
    pub window_days: u32,
    /// Adds all-time high/low columns, at one extra request per symbol.
    pub include_extrema: bool,
    /// Directory the CSV artifact is written to.
    pub output_dir: PathBuf,
    /// Symbols fetched at the same time. 1 fetches strictly in order.
    pub max_concurrency: usize,
    pub request_timeout_secs: u64,
    pub provider: ProviderConfig,
    /// Upload is disabled when absent.
    pub upload: Option<UploadConfig>,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            window_days: 30,
            include_extrema: true,
            output_dir: PathBuf::from("."),
            max_concurrency: 1,
            request_timeout_secs: 30,
            provider: ProviderConfig::default(),
            upload: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    pub base_url: String,
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadConfig {
    /// Existing bucket name. An `s3://` prefix is accepted and stripped.
    pub bucket: String,
    #[serde(default)]
    pub region: Option<String>,
    /// For S3-compatible stores (MinIO, LocalStack, ...).
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
}

impl EtlConfig {
    /// Reads, normalizes and validates a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: EtlConfig = toml::from_str(text)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Configuration for a scheduled run: the file named by
    /// `STOCK_ETL_CONFIG` (defaults if unset) plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match get_env_var_opt(CONFIG_PATH_ENV)? {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Applies the `STOCK_ETL_*` variables that are set, then re-validates.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(symbols) = get_env_var_opt(SYMBOLS_ENV)? {
            self.symbols = symbols.split(',').map(str::to_string).collect();
        }
        if let Some(dir) = get_env_var_opt(OUTPUT_DIR_ENV)? {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(days) = parse_env_var(WINDOW_DAYS_ENV)? {
            self.window_days = days;
        }
        if let Some(include) = parse_env_var(INCLUDE_EXTREMA_ENV)? {
            self.include_extrema = include;
        }
        if let Some(bucket) = get_env_var_opt(BUCKET_ENV)? {
            self.upload.get_or_insert_with(UploadConfig::default).bucket = bucket;
        }
        self.normalize();
        self.validate()
    }

    /// Trims symbols and strips URI decoration from the bucket name.
    pub fn normalize(&mut self) {
        for symbol in &mut self.symbols {
            *symbol = symbol.trim().to_string();
        }
        if let Some(upload) = &mut self.upload {
            let bucket = upload.bucket.trim();
            let bucket = bucket.strip_prefix("s3://").unwrap_or(bucket);
            upload.bucket = bucket.trim_end_matches('/').to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::Invalid("at least one symbol is required".into()));
        }
        let mut seen = HashSet::new();
        for symbol in &self.symbols {
            if symbol.trim().is_empty() {
                return Err(ConfigError::Invalid("symbols must not be blank".into()));
            }
            if !seen.insert(symbol.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate symbol {symbol:?}")));
            }
        }
        if self.window_days == 0 {
            return Err(ConfigError::Invalid("window_days must be at least 1".into()));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid("max_concurrency must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        if let Some(upload) = &self.upload {
            if upload.bucket.trim().is_empty() || upload.bucket.contains('/') {
                return Err(ConfigError::Invalid(format!(
                    "upload bucket {:?} is not a bucket name",
                    upload.bucket
                )));
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn yahoo_settings(&self) -> YahooChartSettings {
        YahooChartSettings {
            base_url: self.provider.base_url.clone(),
            user_agent: self.provider.user_agent.clone(),
            timeout: self.request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use tempfile::NamedTempFile;

    use super::*;

    fn clear_env() {
        for name in [
            CONFIG_PATH_ENV,
            SYMBOLS_ENV,
            OUTPUT_DIR_ENV,
            WINDOW_DAYS_ENV,
            INCLUDE_EXTREMA_ENV,
            BUCKET_ENV,
        ] {
            unsafe { std::env::remove_var(name) };
        }
    }

    #[test]
    fn empty_file_is_default() {
        let config = EtlConfig::from_toml_str("").unwrap();
        assert_eq!(config, EtlConfig::default());
        assert_eq!(config.symbols.len(), 10);
        assert!(config.upload.is_none());
    }

    #[test]
    fn parses_upload_and_strips_scheme() {
        let config = EtlConfig::from_toml_str(
            r#"
symbols = [" ASML ", "MELI"]
window_days = 5

[upload]
bucket = "s3://yfinance-airflow-etl-data/"
force_path_style = true
"#,
        )
        .unwrap();

        assert_eq!(config.symbols, ["ASML", "MELI"]);
        assert_eq!(config.window_days, 5);
        let upload = config.upload.unwrap();
        assert_eq!(upload.bucket, "yfinance-airflow-etl-data");
        assert!(upload.force_path_style);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        assert!(matches!(
            EtlConfig::from_toml_str("tickers = [\"AAPL\"]"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EtlConfig::from_toml_str("symbols = []"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EtlConfig::from_toml_str("symbols = [\"AAPL\", \"AAPL\"]"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EtlConfig::from_toml_str("window_days = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EtlConfig::from_toml_str("[upload]\nbucket = \"a/b\""),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = EtlConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    #[serial]
    fn env_overrides_file() {
        clear_env();
        let mut file = NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"symbols = [\"AAPL\"]\n").unwrap();
        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, file.path());
            std::env::set_var(SYMBOLS_ENV, "NFLX, INTC");
            std::env::set_var(BUCKET_ENV, "daily-bars");
            std::env::set_var(INCLUDE_EXTREMA_ENV, "false");
        }

        let config = EtlConfig::from_env();
        clear_env();
        let config = config.unwrap();

        assert_eq!(config.symbols, ["NFLX", "INTC"]);
        assert!(!config.include_extrema);
        assert_eq!(config.upload.unwrap().bucket, "daily-bars");
    }

    #[test]
    #[serial]
    fn unparsable_env_value_is_an_error() {
        clear_env();
        unsafe { std::env::set_var(WINDOW_DAYS_ENV, "a month") };
        let result = EtlConfig::default().apply_env_overrides();
        clear_env();
        assert!(matches!(result, Err(ConfigError::Env(EnvVarError::Parse { .. }))));
    }

    #[test]
    #[serial]
    fn from_env_without_file_uses_defaults() {
        clear_env();
        let config = EtlConfig::from_env().unwrap();
        assert_eq!(config, EtlConfig::default());
    }
}
