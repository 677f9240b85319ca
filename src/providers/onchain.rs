//! On-chain canonical dump provider
//!
//! Daily metrics (realized price, active addresses, MVRV, ...) are
//! pre-computed by a batch job and served as static JSON files. Dump
//! filenames have drifted across batch-job versions, so each metric maps to
//! an ordered list of candidate files; the first one yielding at least two
//! usable points wins.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::cache::SeriesCache;
use crate::constants::ONCHAIN_TIMEOUT_MS;
use crate::error::{EngineError, Result};
use crate::models::{normalize, Series, SeriesPoint, Timeframe};
use crate::providers::HttpFetcher;
use crate::window;

const DUMP_BASE_URL: &str = "https://dumps.chartgraph.dev/onchain";

/// Metric key → candidate dump filenames, newest naming first
const DUMP_FILE_CANDIDATES: &[(&str, &[&str])] = &[
    ("realized-price", &["realized_price.json", "realized-price.json"]),
    ("mvrv", &["mvrv_ratio.json", "mvrv.json"]),
    ("active-addresses", &["active_addresses.json", "activeaddresses.json"]),
    ("hash-rate", &["hash_rate.json", "hashrate.json"]),
    ("supply-in-profit", &["supply_in_profit.json"]),
];

/// One sample inside a dump file: `{"t": epoch seconds, "v": value}`
#[derive(Debug, Deserialize)]
struct DumpPoint {
    t: i64,
    v: Option<f64>,
}

pub struct OnChainDumpProvider {
    http: Arc<HttpFetcher>,
    cache: Arc<SeriesCache>,
}

impl OnChainDumpProvider {
    pub fn new(http: Arc<HttpFetcher>, cache: Arc<SeriesCache>) -> Self {
        Self { http, cache }
    }

    /// Fetch one dump metric trimmed to `timeframe`; stale-or-empty on
    /// failure or when no candidate file has usable data.
    pub async fn fetch(&self, metric_key: &str, timeframe: Timeframe) -> Series {
        let raw_key =
            SeriesCache::raw_key("onchain", &format!("{}:{}", metric_key, timeframe.label()));
        if let Some(series) = self.cache.fresh(&raw_key).await {
            return series;
        }

        match self.fetch_candidates(metric_key, timeframe).await {
            Ok(series) => {
                self.cache.store(&raw_key, series.clone()).await;
                series
            }
            Err(e) => {
                warn!("On-chain fetch failed for {}: {}", metric_key, e);
                self.cache.stale(&raw_key).await.unwrap_or_default()
            }
        }
    }

    async fn fetch_candidates(&self, metric_key: &str, timeframe: Timeframe) -> Result<Series> {
        let Some(&(_, candidates)) = DUMP_FILE_CANDIDATES
            .iter()
            .find(|(key, _)| *key == metric_key)
        else {
            return Err(EngineError::UnknownChart(format!(
                "No dump mapping for metric '{}'",
                metric_key
            )));
        };

        let mut last_err =
            EngineError::Network(format!("No candidate files for {}", metric_key));

        for file in candidates {
            match self.fetch_file(file, timeframe).await {
                Ok(series) if series.len() >= 2 => {
                    debug!("Dump {} served {} from {}", metric_key, series.len(), file);
                    return Ok(series);
                }
                Ok(short) => {
                    debug!("Dump file {} had {} usable points, trying next", file, short.len());
                }
                Err(e) => {
                    debug!("Dump file {} failed: {}", file, e);
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }

    async fn fetch_file(&self, file: &str, timeframe: Timeframe) -> Result<Series> {
        let url = format!("{}/{}", DUMP_BASE_URL, file);
        let body = self
            .http
            .get_text(&url, Duration::from_millis(ONCHAIN_TIMEOUT_MS))
            .await?;

        let rows: Vec<DumpPoint> = serde_json::from_str(&body)?;
        let points: Series = rows
            .into_iter()
            .filter_map(|row| row.v.map(|v| SeriesPoint::new(row.t * 1000, v)))
            .collect();

        Ok(window::limit(
            normalize(points),
            timeframe.days(),
            Utc::now().timestamp_millis(),
        ))
    }
}
