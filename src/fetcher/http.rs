//! reqwest-backed upstream API client
//!
//! The only place that talks HTTP. Every non-2xx response becomes
//! [`FetchError::Status`] carrying the numeric status; transport and body
//! failures become [`FetchError::Network`] / [`FetchError::Parse`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::{ApiConfig, ConfigError};
use crate::fetcher::{ApiTransport, FetchError, FetchResult};
use crate::metrics::HttpRequestMetrics;

/// HTTP connect timeout (seconds)
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
/// HTTP request timeout (seconds)
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Header carrying the company token (`Company`)
const COMPANY_HEADER: HeaderName = HeaderName::from_static("company");

/// Authenticated JSON client for the upstream API
#[derive(Debug, Clone)]
pub struct ApiHttpClient {
    client: Client,
    base_url: String,
}

impl ApiHttpClient {
    /// Build a client with auth headers and timeouts from `config`
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, header_value("user token", &config.user_token)?);
        headers.insert(
            COMPANY_HEADER,
            header_value("company token", &config.company_token)?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn header_value(what: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|_| ConfigError::Invalid(format!("{what} is not a valid header value")))?;
    header.set_sensitive(true);
    Ok(header)
}

#[async_trait]
impl ApiTransport for ApiHttpClient {
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> FetchResult<Value> {
        let url = self.url(path);
        let metrics = HttpRequestMetrics::start(path);

        let response = match self.client.get(&url).query(query).send().await {
            Ok(response) => response,
            Err(e) => {
                metrics.record_network_error();
                return Err(FetchError::Network(e.to_string()));
            }
        };

        let status = response.status();
        metrics.record_complete(status.as_u16());

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Parse(format!("invalid JSON from {path}: {e}")))?;

        debug!(
            correlation_id = %metrics.correlation_id(),
            path,
            "Response decoded"
        );
        Ok(body)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
