//! Sentiment index provider
//!
//! The fear-and-greed endpoint returns the full index history in one JSON
//! document with string-typed numbers.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use crate::cache::SeriesCache;
use crate::constants::SENTIMENT_TIMEOUT_MS;
use crate::error::Result;
use crate::models::{normalize, Series, SeriesPoint, Timeframe};
use crate::providers::HttpFetcher;
use crate::window;

const SENTIMENT_URL: &str = "https://api.alternative.me/fng/?limit=0&format=json";

#[derive(Debug, Deserialize)]
struct SentimentResponse {
    data: Vec<SentimentRow>,
}

#[derive(Debug, Deserialize)]
struct SentimentRow {
    value: String,
    timestamp: String,
}

pub struct SentimentProvider {
    http: Arc<HttpFetcher>,
    cache: Arc<SeriesCache>,
}

impl SentimentProvider {
    pub fn new(http: Arc<HttpFetcher>, cache: Arc<SeriesCache>) -> Self {
        Self { http, cache }
    }

    /// Fetch the index trimmed to `timeframe`; stale-or-empty on failure.
    pub async fn fetch(&self, timeframe: Timeframe) -> Series {
        let raw_key = SeriesCache::raw_key("sentiment", timeframe.label());
        if let Some(series) = self.cache.fresh(&raw_key).await {
            return series;
        }

        match self.fetch_live(timeframe).await {
            Ok(series) => {
                self.cache.store(&raw_key, series.clone()).await;
                series
            }
            Err(e) => {
                warn!("Sentiment fetch failed: {}", e);
                self.cache.stale(&raw_key).await.unwrap_or_default()
            }
        }
    }

    async fn fetch_live(&self, timeframe: Timeframe) -> Result<Series> {
        let body = self
            .http
            .get_text(SENTIMENT_URL, Duration::from_millis(SENTIMENT_TIMEOUT_MS))
            .await?;

        let response: SentimentResponse = serde_json::from_str(&body)?;
        let points: Series = response
            .data
            .into_iter()
            .filter_map(|row| {
                let ts = row.timestamp.parse::<i64>().ok()?;
                let value = row.value.parse::<f64>().ok()?;
                Some(SeriesPoint::new(ts * 1000, value))
            })
            .collect();

        Ok(window::limit(
            normalize(points),
            timeframe.days(),
            Utc::now().timestamp_millis(),
        ))
    }
}
