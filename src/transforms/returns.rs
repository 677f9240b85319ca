//! Return-on-investment transforms
//!
//! Anchored ROI (fixed date or historical event), rolling-window return and
//! point-over-point daily return. All values are percentages.

use chrono::NaiveDate;
use tracing::warn;

use crate::constants::DAY_MS;
use crate::models::{Series, SeriesPoint};

/// ROI relative to the first point at or after `anchor_ts`.
///
/// Falls back to the first point overall when the anchor predates or
/// postdates the series. A zero or non-finite anchor value yields an empty
/// series; everything from the anchor onward is `(v / anchor - 1) * 100`.
pub fn roi_anchor(series: &Series, anchor_ts: i64) -> Series {
    let anchor_idx = series
        .iter()
        .position(|p| p.ts >= anchor_ts)
        .unwrap_or(0);

    let Some(anchor) = series.get(anchor_idx) else {
        return Vec::new();
    };
    if anchor.value == 0.0 || !anchor.value.is_finite() {
        return Vec::new();
    }

    series[anchor_idx..]
        .iter()
        .map(|p| SeriesPoint::new(p.ts, (p.value / anchor.value - 1.0) * 100.0))
        .collect()
}

/// ROI anchored to the most recent event date that falls inside the
/// series' own timestamp range; none in range anchors to the first point.
pub fn event_anchored_roi(series: &Series, event_dates: &[&str]) -> Series {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Vec::new();
    };

    let anchor_ts = event_ts_millis(event_dates)
        .into_iter()
        .filter(|&ts| ts >= first.ts && ts <= last.ts)
        .max()
        .unwrap_or(first.ts);

    roi_anchor(series, anchor_ts)
}

/// Rolling return: for each point, percentage change against the latest
/// earlier point at or before `ts - lookback_days`.
pub fn rolling_return(series: &Series, lookback_days: i64) -> Series {
    let lookback_ms = lookback_days * DAY_MS;
    let mut out = Vec::with_capacity(series.len());
    let mut base = 0usize;

    for (i, p) in series.iter().enumerate() {
        let target = p.ts - lookback_ms;
        // base chases the latest point at or before the lookback target
        while base + 1 < i && series[base + 1].ts <= target {
            base += 1;
        }
        if series[base].ts > target {
            continue;
        }
        let prev = series[base].value;
        if prev != 0.0 && prev.is_finite() {
            out.push(SeriesPoint::new(p.ts, (p.value / prev - 1.0) * 100.0));
        }
    }

    out
}

/// Point-over-point percentage change, skipping zero or non-finite
/// denominators.
pub fn daily_return(series: &Series) -> Series {
    series
        .windows(2)
        .filter_map(|w| {
            let (prev, curr) = (w[0], w[1]);
            if prev.value == 0.0 || !prev.value.is_finite() {
                return None;
            }
            Some(SeriesPoint::new(
                curr.ts,
                (curr.value / prev.value - 1.0) * 100.0,
            ))
        })
        .collect()
}

/// Parse an event date table into epoch milliseconds at UTC midnight.
/// Malformed entries are skipped with a warning rather than failing the
/// whole transform.
pub fn event_ts_millis(dates: &[&str]) -> Vec<i64> {
    dates
        .iter()
        .filter_map(|d| match d.parse::<NaiveDate>() {
            Ok(date) => Some(
                date.and_hms_opt(0, 0, 0)
                    .expect("midnight is always valid")
                    .and_utc()
                    .timestamp_millis(),
            ),
            Err(e) => {
                warn!("Skipping malformed event date '{}': {}", d, e);
                None
            }
        })
        .collect()
}
