//! Pure numeric transform library
//!
//! Every function here is `Series -> Series` (or two series in, one out)
//! with no clock, network or catalog access; the resolver owns all of that.

mod indicators;
mod merge;
mod regression;
mod returns;
mod stats;

pub use indicators::{bollinger_position, ema, macd_histogram, rolling_stddev, rsi, sma};
pub use merge::merge;
pub use regression::{log_regression, LogRegression};
pub use returns::{daily_return, event_anchored_roi, event_ts_millis, roi_anchor, rolling_return};
pub use stats::{drawdown_from_peak, rolling_correlation};
