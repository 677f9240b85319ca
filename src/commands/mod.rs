pub mod catalog;
pub mod resolve;
pub mod sweep;

use crate::constants::{FALLBACK_TIMEFRAME_DAYS, RENDERABLE_MIN_POINTS};
use crate::models::{Series, Timeframe};
use crate::resolver::Resolver;

/// Caller-side retry policy shared by the resolve and sweep commands.
///
/// The engine never auto-widens; when the requested window resolves short
/// we retry once at the chart's own maximum supported lookback, then at the
/// fixed 365-day fallback, before accepting "no data".
pub async fn resolve_with_retry(
    resolver: &Resolver,
    chart_id: &str,
    timeframe: Timeframe,
    currency: &str,
) -> Series {
    let series = resolver.resolve(chart_id, timeframe, currency).await;
    if series.len() >= RENDERABLE_MIN_POINTS {
        return series;
    }

    let widest = Timeframe::clamp(resolver.catalog().max_lookback_days(chart_id));
    if widest != timeframe {
        let series = resolver.resolve(chart_id, widest, currency).await;
        if series.len() >= RENDERABLE_MIN_POINTS {
            return series;
        }
    }

    let fallback = Timeframe::clamp(FALLBACK_TIMEFRAME_DAYS);
    if fallback != timeframe && fallback != widest {
        return resolver.resolve(chart_id, fallback, currency).await;
    }

    series
}
