//! Special-transform registry
//!
//! Each [`SpecialTransform`] maps 1:1 to a lookback-inflation rule and a
//! transform function. Adding a transform means adding a variant and its
//! two match arms here; the resolver itself never grows per-id branches.

use tracing::warn;

use crate::constants::{
    BOLLINGER_WINDOW, CORRELATION_WINDOW, CYCLE_BOTTOM_DATES, CYCLE_PEAK_DATES,
    EMA_WARMUP_FACTOR, EVENT_ROI_MIN_LOOKBACK_DAYS, HALVING_DATES, MACD_SIGNAL_PERIOD,
    MACD_SLOW_PERIOD, RSI_PERIOD, SUB_CYCLE_BOTTOM_DATES,
};
use crate::models::{Series, SpecialTransform, Timeframe};
use crate::transforms;

impl SpecialTransform {
    /// Days of history the transform needs to produce valid output across a
    /// visible window of `requested_days`.
    pub fn inflate_lookback(&self, requested_days: i64) -> i64 {
        match self {
            // Event anchors must lie inside the resolved range, so these
            // always pull at least a decade regardless of zoom level
            SpecialTransform::RoiSinceHalving
            | SpecialTransform::RoiSinceCycleBottom
            | SpecialTransform::RoiSinceCyclePeak
            | SpecialTransform::RoiSinceSubCycleBottom
            | SpecialTransform::RoiSinceDate(_) => {
                requested_days.max(EVENT_ROI_MIN_LOOKBACK_DAYS)
            }
            SpecialTransform::RollingRoi(days) => requested_days + days,
            SpecialTransform::DailyReturn => requested_days + 1,

            SpecialTransform::Sma(window) | SpecialTransform::RollingStdDev(window) => {
                requested_days + *window as i64
            }
            SpecialTransform::Ema(period) => requested_days + *period as i64 * EMA_WARMUP_FACTOR,
            SpecialTransform::Rsi => requested_days + (RSI_PERIOD as i64) * EMA_WARMUP_FACTOR,
            SpecialTransform::MacdHistogram => {
                requested_days + ((MACD_SLOW_PERIOD + MACD_SIGNAL_PERIOD) as i64) * 2
            }
            SpecialTransform::BollingerPosition => requested_days + BOLLINGER_WINDOW as i64,
            SpecialTransform::RollingCorrelation => requested_days + CORRELATION_WINDOW as i64 + 1,

            // The fit and the running peak are computed over full history
            SpecialTransform::LogTrend
            | SpecialTransform::LogFairValue
            | SpecialTransform::RainbowDeviation
            | SpecialTransform::DrawdownFromPeak => Timeframe::Year50.days(),
        }
    }

    /// The effective timeframe a dependency is resolved at
    pub fn effective_timeframe(&self, requested: Timeframe) -> Timeframe {
        Timeframe::clamp(self.inflate_lookback(requested.days()))
    }

    /// Run the transform. `secondary` is present exactly when
    /// [`SpecialTransform::needs_secondary`] says so; a missing secondary
    /// degrades to empty instead of panicking.
    pub fn apply(&self, primary: &Series, secondary: Option<&Series>) -> Series {
        match self {
            SpecialTransform::RoiSinceHalving => {
                transforms::event_anchored_roi(primary, HALVING_DATES)
            }
            SpecialTransform::RoiSinceCycleBottom => {
                transforms::event_anchored_roi(primary, CYCLE_BOTTOM_DATES)
            }
            SpecialTransform::RoiSinceCyclePeak => {
                transforms::event_anchored_roi(primary, CYCLE_PEAK_DATES)
            }
            SpecialTransform::RoiSinceSubCycleBottom => {
                transforms::event_anchored_roi(primary, SUB_CYCLE_BOTTOM_DATES)
            }
            SpecialTransform::RoiSinceDate(anchor_ts) => {
                transforms::roi_anchor(primary, *anchor_ts)
            }
            SpecialTransform::RollingRoi(days) => transforms::rolling_return(primary, *days),
            SpecialTransform::DailyReturn => transforms::daily_return(primary),

            SpecialTransform::Sma(window) => transforms::sma(primary, *window),
            SpecialTransform::Ema(period) => transforms::ema(primary, *period),
            SpecialTransform::RollingStdDev(window) => {
                transforms::rolling_stddev(primary, *window)
            }
            SpecialTransform::Rsi => transforms::rsi(primary),
            SpecialTransform::MacdHistogram => transforms::macd_histogram(primary),
            SpecialTransform::BollingerPosition => transforms::bollinger_position(primary),
            SpecialTransform::LogTrend => transforms::log_regression(primary).trend,
            SpecialTransform::LogFairValue => transforms::log_regression(primary).fair,
            SpecialTransform::RainbowDeviation => transforms::log_regression(primary).rainbow,
            SpecialTransform::DrawdownFromPeak => transforms::drawdown_from_peak(primary),

            SpecialTransform::RollingCorrelation => match secondary {
                Some(other) => transforms::rolling_correlation(primary, other),
                None => {
                    warn!("Correlation transform resolved without a secondary series");
                    Vec::new()
                }
            },
        }
    }
}
