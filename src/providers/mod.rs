//! Upstream provider adapters
//!
//! One adapter per data source. Each one builds its own requests, parses
//! its own payload shape, filters unusable points and trims to the caller's
//! window. They all share the series cache and the proxied HTTP fetcher,
//! and they all degrade to stale-or-empty instead of surfacing errors.

mod fees;
mod macro_series;
mod market;
mod onchain;
mod rate_gate;
mod sentiment;

pub use fees::FeeProvider;
pub use macro_series::MacroSeriesProvider;
pub use market::MarketChartProvider;
pub use onchain::OnChainDumpProvider;
pub use rate_gate::RateGate;
pub use sentiment::SentimentProvider;

use std::time::Duration;

use reqwest::Url;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

/// Hosts the proxy will forward to. Everything else is refused before a
/// request is built.
const ALLOWED_HOSTS: &[&str] = &[
    "api.coingecko.com",
    "stooq.com",
    "api.alternative.me",
    "mempool.space",
    "dumps.chartgraph.dev",
];

/// Shared HTTP front for every adapter: allowlist enforcement, optional
/// same-origin proxy routing, per-call timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
    proxy_base: String,
}

impl HttpFetcher {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| EngineError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            proxy_base: config.proxy_base.trim().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch `target` as text within `timeout`.
    ///
    /// `target` must be an absolute HTTPS URL whose host is on the
    /// allowlist; when a proxy base is configured the request is routed
    /// through it with the target as a query parameter.
    pub async fn get_text(&self, target: &str, timeout: Duration) -> Result<String> {
        let url = Url::parse(target)
            .map_err(|e| EngineError::Config(format!("Invalid URL '{}': {}", target, e)))?;

        if url.scheme() != "https" {
            return Err(EngineError::Config(format!(
                "Refusing non-HTTPS upstream URL: {}",
                target
            )));
        }
        let host = url
            .host_str()
            .ok_or_else(|| EngineError::Config(format!("URL without host: {}", target)))?;
        if !ALLOWED_HOSTS.contains(&host) {
            return Err(EngineError::Config(format!(
                "Host not on the proxy allowlist: {}",
                host
            )));
        }

        let request_url = if self.proxy_base.is_empty() {
            url
        } else {
            Url::parse_with_params(&self.proxy_base, &[("url", target)])
                .map_err(|e| EngineError::Config(format!("Bad proxy base: {}", e)))?
        };

        debug!("GET {} (budget {:?})", request_url, timeout);

        let response = tokio::time::timeout(timeout, self.client.get(request_url).send())
            .await
            .map_err(|_| EngineError::Timeout(timeout.as_millis() as u64))?
            .map_err(|e| EngineError::Network(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(EngineError::RateLimit);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Network(format!(
                "Upstream returned {}: {}",
                status, body
            )));
        }

        tokio::time::timeout(timeout, response.text())
            .await
            .map_err(|_| EngineError::Timeout(timeout.as_millis() as u64))?
            .map_err(|e| EngineError::Network(format!("Failed to read response body: {}", e)))
    }
}
