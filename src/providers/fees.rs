//! Network-fee provider
//!
//! Daily average fee-rate history from the mempool explorer API.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use crate::cache::SeriesCache;
use crate::constants::FEES_TIMEOUT_MS;
use crate::error::Result;
use crate::models::{normalize, Series, SeriesPoint, Timeframe};
use crate::providers::HttpFetcher;
use crate::window;

const FEES_URL: &str = "https://mempool.space/api/v1/mining/blocks/fee-rates/all";

#[derive(Debug, Deserialize)]
struct FeeRow {
    timestamp: i64,
    #[serde(rename = "avgFee_50")]
    avg_fee: Option<f64>,
}

pub struct FeeProvider {
    http: Arc<HttpFetcher>,
    cache: Arc<SeriesCache>,
}

impl FeeProvider {
    pub fn new(http: Arc<HttpFetcher>, cache: Arc<SeriesCache>) -> Self {
        Self { http, cache }
    }

    /// Fetch fee history trimmed to `timeframe`; stale-or-empty on failure.
    pub async fn fetch(&self, timeframe: Timeframe) -> Series {
        let raw_key = SeriesCache::raw_key("fees", timeframe.label());
        if let Some(series) = self.cache.fresh(&raw_key).await {
            return series;
        }

        match self.fetch_live(timeframe).await {
            Ok(series) => {
                self.cache.store(&raw_key, series.clone()).await;
                series
            }
            Err(e) => {
                warn!("Fee fetch failed: {}", e);
                self.cache.stale(&raw_key).await.unwrap_or_default()
            }
        }
    }

    async fn fetch_live(&self, timeframe: Timeframe) -> Result<Series> {
        let body = self
            .http
            .get_text(FEES_URL, Duration::from_millis(FEES_TIMEOUT_MS))
            .await?;

        let rows: Vec<FeeRow> = serde_json::from_str(&body)?;
        let points: Series = rows
            .into_iter()
            .filter_map(|row| row.avg_fee.map(|v| SeriesPoint::new(row.timestamp * 1000, v)))
            .collect();

        Ok(window::limit(
            normalize(points),
            timeframe.days(),
            Utc::now().timestamp_millis(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_row_parses() {
        let rows: Vec<FeeRow> = serde_json::from_str(
            r#"[{"timestamp":1700000000,"avgHeight":100,"avgFee_50":12.5},
                {"timestamp":1700086400,"avgHeight":101}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].avg_fee, Some(12.5));
        assert!(rows[1].avg_fee.is_none());
    }
}
