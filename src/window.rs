//! Timeframe canonicalization
//!
//! Trims a resolved series to the caller's visible window and pads
//! degenerate results up to the renderable minimum of two points.

use crate::constants::{DAY_MS, RENDERABLE_MIN_POINTS, TRAILING_FALLBACK_POINTS};
use crate::models::{Series, SeriesPoint};

/// Trim `series` to the trailing `days` window ending at `now_ms`.
///
/// If the filter leaves fewer than 2 points but more history exists, fall
/// back to the unfiltered series capped at its trailing 12 points: a chart
/// window is never starved while upstream data is available.
pub fn limit(series: Series, days: i64, now_ms: i64) -> Series {
    let cutoff = now_ms - days * DAY_MS;
    let filtered: Series = series.iter().filter(|p| p.ts >= cutoff).copied().collect();

    if filtered.len() >= RENDERABLE_MIN_POINTS {
        return filtered;
    }

    let start = series.len().saturating_sub(TRAILING_FALLBACK_POINTS);
    series[start..].to_vec()
}

/// Expand a single-point series to two points by repeating the value one
/// day earlier, so every non-empty output is chart-renderable.
pub fn ensure_renderable(mut series: Series) -> Series {
    if series.len() == 1 {
        let only = series[0];
        series.insert(0, SeriesPoint::new(only.ts - DAY_MS, only.value));
    }
    series
}
