//! Engine-wide constants
//!
//! Timeframe buckets, resolution guards, indicator parameters and the
//! historical event tables used by the anchored-ROI transforms.

/// Milliseconds in one day
pub const DAY_MS: i64 = 86_400_000;

/// Maximum recursion depth for chart resolution
///
/// A well-formed catalog stays far below this. The ceiling exists so that a
/// miswired definition degrades to an empty series instead of overflowing
/// the stack.
pub const MAX_RESOLUTION_DEPTH: u32 = 10;

/// Minimum number of points a chart consumer can render
pub const RENDERABLE_MIN_POINTS: usize = 2;

/// Trailing points returned when a window filter leaves too little data
pub const TRAILING_FALLBACK_POINTS: usize = 12;

/// Timeframe used for the final caller-side retry when a chart resolves
/// short at both the requested window and its own maximum lookback
pub const FALLBACK_TIMEFRAME_DAYS: i64 = 365;

// Indicator parameters. These match the published definitions of each
// indicator; changing them silently changes chart semantics.
pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST_PERIOD: usize = 12;
pub const MACD_SLOW_PERIOD: usize = 26;
pub const MACD_SIGNAL_PERIOD: usize = 9;
pub const BOLLINGER_WINDOW: usize = 20;
pub const BOLLINGER_WIDTH: f64 = 2.0;
pub const CORRELATION_WINDOW: usize = 90;

/// Minimum usable points for the log-regression fit
pub const LOG_REGRESSION_MIN_POINTS: usize = 120;

/// Extra lookback granted to EMA-family transforms so the smoothing has
/// converged by the start of the visible window
pub const EMA_WARMUP_FACTOR: i64 = 3;

/// Lookback floor for event-anchored ROI charts; the event tables below all
/// have at least one entry inside this window
pub const EVENT_ROI_MIN_LOOKBACK_DAYS: i64 = 3650;

// Per-provider network budgets (milliseconds)
pub const MARKET_TIMEOUT_MS: u64 = 9_000;
pub const MACRO_TIMEOUT_MS: u64 = 7_500;
pub const ONCHAIN_TIMEOUT_MS: u64 = 6_000;
pub const SENTIMENT_TIMEOUT_MS: u64 = 4_500;
pub const FEES_TIMEOUT_MS: u64 = 4_500;

/// Bounded retry attempts per provider request
pub const MAX_FETCH_ATTEMPTS: u32 = 3;

/// Minimum spacing between market-chart requests
pub const MARKET_MIN_GAP_MS: u64 = 1_500;

/// Ceiling for the adaptive market-chart request gap
pub const MARKET_MAX_GAP_MS: u64 = 60_000;

/// Bitcoin halving dates (UTC)
pub const HALVING_DATES: &[&str] = &["2012-11-28", "2016-07-09", "2020-05-11", "2024-04-20"];

/// Bear-market cycle bottoms (UTC)
pub const CYCLE_BOTTOM_DATES: &[&str] =
    &["2011-11-19", "2015-01-14", "2018-12-15", "2022-11-21"];

/// Bull-market cycle peaks (UTC)
pub const CYCLE_PEAK_DATES: &[&str] = &["2011-06-08", "2013-11-30", "2017-12-17", "2021-11-10"];

/// Intra-cycle corrective lows (UTC)
pub const SUB_CYCLE_BOTTOM_DATES: &[&str] =
    &["2013-07-05", "2017-01-11", "2019-12-18", "2021-07-20", "2024-08-05"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tables_are_ordered() {
        for table in [
            HALVING_DATES,
            CYCLE_BOTTOM_DATES,
            CYCLE_PEAK_DATES,
            SUB_CYCLE_BOTTOM_DATES,
        ] {
            let mut sorted = table.to_vec();
            sorted.sort();
            assert_eq!(sorted, table.to_vec());
        }
    }
}
