//! Asset market-chart provider
//!
//! Dense price/cap/volume history per tracked asset. The upstream rate
//! limit applies per IP, so every request goes through the shared adaptive
//! gate; when history is unavailable the adapter degrades to a two-point
//! flat series built from the spot snapshot so downstream consumers never
//! see a single-point series from this source.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::SeriesCache;
use crate::constants::{DAY_MS, MARKET_TIMEOUT_MS, MAX_FETCH_ATTEMPTS};
use crate::error::{EngineError, Result};
use crate::models::{normalize, AssetMetric, Series, SeriesPoint, Timeframe};
use crate::providers::{HttpFetcher, RateGate};
use crate::window;

const MARKET_BASE_URL: &str = "https://api.coingecko.com/api/v3";

pub struct MarketChartProvider {
    http: Arc<HttpFetcher>,
    cache: Arc<SeriesCache>,
    gate: Arc<RateGate>,
}

impl MarketChartProvider {
    pub fn new(http: Arc<HttpFetcher>, cache: Arc<SeriesCache>, gate: Arc<RateGate>) -> Self {
        Self { http, cache, gate }
    }

    /// Fetch one asset metric trimmed to `timeframe`. Never fails: on
    /// upstream trouble the stale cache tier is served, then empty.
    pub async fn fetch(
        &self,
        asset: &str,
        metric: AssetMetric,
        currency: &str,
        timeframe: Timeframe,
    ) -> Series {
        let raw_key = SeriesCache::raw_key(
            "market",
            &format!("{}:{}:{}:{}", asset, metric.payload_field(), currency, timeframe.label()),
        );
        if let Some(series) = self.cache.fresh(&raw_key).await {
            return series;
        }

        match self.fetch_live(asset, metric, currency, timeframe).await {
            Ok(series) if series.len() >= 2 => {
                self.cache.store(&raw_key, series.clone()).await;
                series
            }
            Ok(_) => {
                debug!("No market history for {}, trying spot fallback", asset);
                match self.spot_fallback(asset, currency, timeframe).await {
                    Ok(flat) => {
                        self.cache.store(&raw_key, flat.clone()).await;
                        flat
                    }
                    Err(e) => {
                        warn!("Spot fallback failed for {}: {}", asset, e);
                        self.cache.stale(&raw_key).await.unwrap_or_default()
                    }
                }
            }
            Err(e) => {
                warn!("Market fetch failed for {} ({}): {}", asset, currency, e);
                self.cache.stale(&raw_key).await.unwrap_or_default()
            }
        }
    }

    async fn fetch_live(
        &self,
        asset: &str,
        metric: AssetMetric,
        currency: &str,
        timeframe: Timeframe,
    ) -> Result<Series> {
        let url = format!(
            "{}/coins/{}/market_chart?vs_currency={}&days={}",
            MARKET_BASE_URL,
            asset,
            currency,
            timeframe.days()
        );

        let body = self.request_with_backoff(&url).await?;
        let json: Value = serde_json::from_str(&body)?;

        let rows = json[metric.payload_field()]
            .as_array()
            .ok_or_else(|| {
                EngineError::Parse(format!("Missing '{}' field", metric.payload_field()))
            })?;

        let points: Series = rows
            .iter()
            .filter_map(|row| {
                // Timestamps arrive as integers or floats depending on the
                // payload version
                let ts_field = row.get(0)?;
                let ts = ts_field
                    .as_i64()
                    .or_else(|| ts_field.as_f64().map(|v| v as i64))?;
                let value = row.get(1)?.as_f64()?;
                Some(SeriesPoint::new(ts, value))
            })
            .collect();

        let series = normalize(points);
        Ok(window::limit(
            series,
            timeframe.days(),
            Utc::now().timestamp_millis(),
        ))
    }

    /// Two-point flat series from the spot snapshot, spanning the window
    async fn spot_fallback(
        &self,
        asset: &str,
        currency: &str,
        timeframe: Timeframe,
    ) -> Result<Series> {
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            MARKET_BASE_URL, asset, currency
        );

        let body = self.request_with_backoff(&url).await?;
        let json: Value = serde_json::from_str(&body)?;
        let spot = json[asset][currency]
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| EngineError::Parse(format!("No spot price for {}", asset)))?;

        let now = Utc::now().timestamp_millis();
        Ok(vec![
            SeriesPoint::new(now - timeframe.days() * DAY_MS, spot),
            SeriesPoint::new(now, spot),
        ])
    }

    /// Bounded retry with jittered exponential backoff; rate-limit
    /// responses widen the shared gate, successes relax it.
    async fn request_with_backoff(&self, url: &str) -> Result<String> {
        let mut last_err = EngineError::Network("No attempts made".to_string());

        for attempt in 0..MAX_FETCH_ATTEMPTS {
            if attempt > 0 {
                let backoff = Duration::from_secs_f64(
                    2.0_f64.powi(attempt as i32 - 1) + rand::random::<f64>(),
                );
                debug!(
                    "Market retry {}/{}, backing off {:.1}s",
                    attempt + 1,
                    MAX_FETCH_ATTEMPTS,
                    backoff.as_secs_f64()
                );
                tokio::time::sleep(backoff).await;
            }

            self.gate.acquire().await;

            match self
                .http
                .get_text(url, Duration::from_millis(MARKET_TIMEOUT_MS))
                .await
            {
                Ok(body) => {
                    self.gate.relax().await;
                    return Ok(body);
                }
                Err(EngineError::RateLimit) => {
                    self.gate.widen().await;
                    last_err = EngineError::RateLimit;
                }
                Err(e) => {
                    warn!("Market request failed (attempt {}): {}", attempt + 1, e);
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }
}
