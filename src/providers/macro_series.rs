//! Macro/economic series provider
//!
//! Sparse daily-to-monthly CSV series for named indicators. Some upstream
//! series ids have been discontinued; those are substituted with a declared
//! alternate (optionally inverted), and a handful of indicators are served
//! from the commodity spot CSV source instead.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};

use crate::cache::SeriesCache;
use crate::constants::MACRO_TIMEOUT_MS;
use crate::error::{EngineError, Result};
use crate::models::{normalize, Series, SeriesPoint, Timeframe};
use crate::providers::HttpFetcher;
use crate::window;

const MACRO_BASE_URL: &str = "https://stooq.com/q/d/l";

/// Discontinued primary ids and their replacements.
/// `(primary, alternate, reciprocal)`; when `reciprocal` is set the
/// alternate series is inverted to preserve the original orientation.
const SERIES_SUBSTITUTIONS: &[(&str, &str, bool)] = &[
    ("twexm", "dx.f", false),
    ("dtwexb", "dx.f", false),
    ("usdcny", "cnyusd", true),
];

/// Indicator ids served by the commodity spot source
const COMMODITY_SPOT_SERIES: &[(&str, &str)] = &[
    ("gold-spot", "xauusd"),
    ("silver-spot", "xagusd"),
    ("oil-spot", "cl.f"),
];

pub struct MacroSeriesProvider {
    http: Arc<HttpFetcher>,
    cache: Arc<SeriesCache>,
}

impl MacroSeriesProvider {
    pub fn new(http: Arc<HttpFetcher>, cache: Arc<SeriesCache>) -> Self {
        Self { http, cache }
    }

    /// Fetch one named series trimmed to `timeframe`; stale-or-empty on
    /// failure.
    pub async fn fetch(&self, series_id: &str, timeframe: Timeframe) -> Series {
        let raw_key =
            SeriesCache::raw_key("macro", &format!("{}:{}", series_id, timeframe.label()));
        if let Some(series) = self.cache.fresh(&raw_key).await {
            return series;
        }

        match self.fetch_live(series_id, timeframe).await {
            Ok(series) if !series.is_empty() => {
                self.cache.store(&raw_key, series.clone()).await;
                series
            }
            Ok(series) => series,
            Err(e) => {
                warn!("Macro fetch failed for {}: {}", series_id, e);
                self.cache.stale(&raw_key).await.unwrap_or_default()
            }
        }
    }

    async fn fetch_live(&self, series_id: &str, timeframe: Timeframe) -> Result<Series> {
        if let Some(&(_, symbol)) = COMMODITY_SPOT_SERIES
            .iter()
            .find(|(id, _)| *id == series_id)
        {
            debug!("Serving {} from commodity spot source ({})", series_id, symbol);
            return self.fetch_symbol(symbol, timeframe, false).await;
        }

        let primary = self.fetch_symbol(series_id, timeframe, false).await;
        match primary {
            Ok(series) if series.len() >= 2 => Ok(series),
            primary => {
                let Some(&(_, alternate, reciprocal)) = SERIES_SUBSTITUTIONS
                    .iter()
                    .find(|(id, _, _)| *id == series_id)
                else {
                    return primary;
                };
                debug!(
                    "Primary series {} unavailable, substituting {} (reciprocal={})",
                    series_id, alternate, reciprocal
                );
                self.fetch_symbol(alternate, timeframe, reciprocal).await
            }
        }
    }

    async fn fetch_symbol(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        reciprocal: bool,
    ) -> Result<Series> {
        let url = format!("{}/?s={}&i=d", MACRO_BASE_URL, symbol);
        let body = self
            .http
            .get_text(&url, Duration::from_millis(MACRO_TIMEOUT_MS))
            .await?;

        let mut series = parse_series_csv(&body)?;
        if reciprocal {
            series = series
                .into_iter()
                .filter(|p| p.value != 0.0)
                .map(|p| SeriesPoint::new(p.ts, 1.0 / p.value))
                .collect();
        }

        Ok(window::limit(
            series,
            timeframe.days(),
            Utc::now().timestamp_millis(),
        ))
    }
}

/// Parse a `Date,...,Close`-shaped CSV body into points.
///
/// The date is the first column, the value the last; missing markers
/// (`.`, empty) and unparsable rows are skipped, not errors.
fn parse_series_csv(body: &str) -> Result<Series> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut points = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping malformed CSV row: {}", e);
                continue;
            }
        };
        let (Some(date_field), Some(value_field)) =
            (record.get(0), record.get(record.len().saturating_sub(1)))
        else {
            continue;
        };
        if value_field == "." || value_field.is_empty() {
            continue;
        }
        let Ok(date) = date_field.parse::<NaiveDate>() else {
            continue;
        };
        let Ok(value) = value_field.parse::<f64>() else {
            continue;
        };
        let ts = date
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid")
            .and_utc()
            .timestamp_millis();
        points.push(SeriesPoint::new(ts, value));
    }

    if points.is_empty() {
        return Err(EngineError::Parse("CSV body had no usable rows".to_string()));
    }
    Ok(normalize(points))
}
