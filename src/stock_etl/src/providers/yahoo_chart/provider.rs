use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url, header};
use snafu::ResultExt;
use tracing::debug;

use crate::{
    models::{raw_frame::RawFrame, window::HistoryRequest},
    providers::{
        ApiSnafu, ClientBuildSnafu, DataProvider, DecodeSnafu, InvalidBaseUrlSnafu,
        InvalidHeaderSnafu, ProviderError, ProviderInitError, ReqwestSnafu, ValidationSnafu,
        yahoo_chart::{params::construct_params, response::ChartResponse},
    },
};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

// The endpoint rejects requests without a browser-like user agent.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) stock_etl/0.1";

/// Connection settings for [`YahooChartProvider`].
#[derive(Debug, Clone)]
pub struct YahooChartSettings {
    pub base_url: String,
    pub user_agent: String,
    /// Applied by the HTTP client to every request.
    pub timeout: Duration,
}

impl Default for YahooChartSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct YahooChartProvider {
    client: Client,
    base_url: Url,
}

impl YahooChartProvider {
    /// Creates a provider against the public endpoint with default settings.
    pub fn new() -> Result<Self, ProviderInitError> {
        Self::with_settings(&YahooChartSettings::default())
    }

    pub fn with_settings(settings: &YahooChartSettings) -> Result<Self, ProviderInitError> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| {
            InvalidBaseUrlSnafu {
                url: settings.base_url.clone(),
                message: e.to_string(),
            }
            .build()
        })?;
        if base_url.cannot_be_a_base() {
            return InvalidBaseUrlSnafu {
                url: settings.base_url.clone(),
                message: "URL cannot carry a path",
            }
            .fail();
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(&settings.user_agent)
                .context(InvalidHeaderSnafu { name: "User-Agent" })?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self { client, base_url })
    }

    fn chart_url(&self, symbol: &str) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ValidationSnafu {
                    message: format!("base URL {} cannot carry a path", self.base_url),
                }
                .build()
            })?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }
}

/// Picks the most specific error text out of a failed response body.
fn api_error_message(status: reqwest::StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<ChartResponse>(body)
        .ok()
        .and_then(|response| response.chart.error)
    {
        Some(error) => format!("{status}: {} ({})", error.description, error.code),
        None => format!("{status}: {}", String::from_utf8_lossy(body).trim()),
    }
}

#[async_trait]
impl DataProvider for YahooChartProvider {
    async fn fetch_history(&self, request: &HistoryRequest) -> Result<RawFrame, ProviderError> {
        if request.symbol.trim().is_empty() {
            return ValidationSnafu {
                message: "symbol must not be empty",
            }
            .fail();
        }

        let url = self.chart_url(&request.symbol)?;
        let query = construct_params(request, Utc::now());
        debug!(symbol = %request.symbol, range = ?request.range, "requesting chart");

        let response = self
            .client
            .get(url)
            .query(&query)
            .send()
            .await
            .context(ReqwestSnafu)?;
        let status = response.status();
        let body = response.bytes().await.context(ReqwestSnafu)?;

        if !status.is_success() {
            return ApiSnafu {
                message: api_error_message(status, &body),
            }
            .fail();
        }

        let chart = serde_json::from_slice::<ChartResponse>(&body)
            .map_err(|e| {
                DecodeSnafu {
                    message: e.to_string(),
                }
                .build()
            })?
            .chart;

        if let Some(error) = chart.error {
            return ApiSnafu {
                message: format!("{} ({})", error.description, error.code),
            }
            .fail();
        }

        match chart.result.and_then(|results| results.into_iter().next()) {
            Some(result) => result
                .into_raw_frame()
                .map_err(|message| DecodeSnafu { message }.build()),
            None => Ok(RawFrame::default()),
        }
    }
}
