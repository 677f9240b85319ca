//! Technical-analysis transforms
//!
//! Simple and exponential moving averages, rolling deviation, RSI, MACD
//! histogram and Bollinger band position. Each follows the published
//! definition of the indicator so derived charts reproduce the values
//! traders expect.

use crate::constants::{
    BOLLINGER_WIDTH, BOLLINGER_WINDOW, MACD_FAST_PERIOD, MACD_SIGNAL_PERIOD, MACD_SLOW_PERIOD,
    RSI_PERIOD,
};
use crate::models::{Series, SeriesPoint};

/// Simple trailing mean over exactly `window` points.
///
/// No output is produced until the window fills.
pub fn sma(series: &Series, window: usize) -> Series {
    if window == 0 || series.len() < window {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(series.len() - window + 1);
    let mut sum: f64 = series[..window].iter().map(|p| p.value).sum();
    out.push(SeriesPoint::new(series[window - 1].ts, sum / window as f64));

    for i in window..series.len() {
        sum += series[i].value - series[i - window].value;
        out.push(SeriesPoint::new(series[i].ts, sum / window as f64));
    }

    out
}

/// Exponential moving average with `alpha = 2 / (period + 1)`, seeded with
/// the first value.
pub fn ema(series: &Series, period: usize) -> Series {
    let Some(first) = series.first() else {
        return Vec::new();
    };
    if period == 0 {
        return Vec::new();
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(series.len());
    let mut current = first.value;
    out.push(SeriesPoint::new(first.ts, current));

    for p in &series[1..] {
        current = alpha * p.value + (1.0 - alpha) * current;
        out.push(SeriesPoint::new(p.ts, current));
    }

    out
}

/// Rolling population standard deviation over a trailing window, using
/// running sum and sum-of-squares.
pub fn rolling_stddev(series: &Series, window: usize) -> Series {
    if window == 0 || series.len() < window {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(series.len() - window + 1);
    let mut sum = 0.0;
    let mut sum_sq = 0.0;

    for (i, p) in series.iter().enumerate() {
        sum += p.value;
        sum_sq += p.value * p.value;
        if i + 1 > window {
            let old = series[i - window].value;
            sum -= old;
            sum_sq -= old * old;
        }
        if i + 1 >= window {
            let n = window as f64;
            let mean = sum / n;
            // Floating error can push the variance a hair below zero
            let variance = (sum_sq / n - mean * mean).max(0.0);
            out.push(SeriesPoint::new(p.ts, variance.sqrt()));
        }
    }

    out
}

/// Relative Strength Index, Wilder's method.
///
/// Average gain/loss are seeded from the first `RSI_PERIOD` deltas, then
/// exponentially updated as `(avg * (period - 1) + delta) / period`. A zero
/// average loss maps to RSI 100.
pub fn rsi(series: &Series) -> Series {
    let period = RSI_PERIOD;
    if series.len() <= period {
        return Vec::new();
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for w in series[..=period].windows(2) {
        let delta = w[1].value - w[0].value;
        if delta >= 0.0 {
            avg_gain += delta;
        } else {
            avg_loss -= delta;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    let mut out = Vec::with_capacity(series.len() - period);
    out.push(SeriesPoint::new(series[period].ts, rsi_value(avg_gain, avg_loss)));

    for w in series[period..].windows(2) {
        let delta = w[1].value - w[0].value;
        let (gain, loss) = if delta >= 0.0 { (delta, 0.0) } else { (0.0, -delta) };
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
        out.push(SeriesPoint::new(w[1].ts, rsi_value(avg_gain, avg_loss)));
    }

    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// MACD histogram: `EMA(12) - EMA(26)`, signal line `EMA(9)` of that
/// difference, histogram = MACD - signal. The histogram is the value the
/// chart exposes.
pub fn macd_histogram(series: &Series) -> Series {
    if series.len() < MACD_SLOW_PERIOD {
        return Vec::new();
    }

    let fast = ema(series, MACD_FAST_PERIOD);
    let slow = ema(series, MACD_SLOW_PERIOD);

    // Both EMAs are first-value seeded, so they cover every timestamp
    let macd_line: Series = fast
        .iter()
        .zip(slow.iter())
        .map(|(f, s)| SeriesPoint::new(f.ts, f.value - s.value))
        .collect();

    let signal = ema(&macd_line, MACD_SIGNAL_PERIOD);

    macd_line
        .iter()
        .zip(signal.iter())
        .map(|(m, s)| SeriesPoint::new(m.ts, m.value - s.value))
        .collect()
}

/// Position of the price inside its Bollinger bands, in percent.
///
/// Mid is SMA(20), half-width 2 sigma; output is
/// `(price - mid) / (upper - lower) * 100` wherever all three are defined.
/// Zero-width or non-finite bands are dropped.
pub fn bollinger_position(series: &Series) -> Series {
    let window = BOLLINGER_WINDOW;
    if series.len() < window {
        return Vec::new();
    }

    let mid = sma(series, window);
    let dev = rolling_stddev(series, window);
    let offset = window - 1;

    let mut out = Vec::with_capacity(mid.len());
    for (i, (m, d)) in mid.iter().zip(dev.iter()).enumerate() {
        let price = series[offset + i].value;
        let band_width = 2.0 * BOLLINGER_WIDTH * d.value;
        if band_width == 0.0 {
            continue;
        }
        let position = (price - m.value) / band_width * 100.0;
        if position.is_finite() {
            out.push(SeriesPoint::new(m.ts, position));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DAY_MS;

    fn daily(values: &[f64]) -> Series {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| SeriesPoint::new(i as i64 * DAY_MS, v))
            .collect()
    }

    #[test]
    fn test_sma_window_three() {
        let series = daily(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let out = sma(&series, 3);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].value, 2.0);
        assert_eq!(out[1].value, 3.0);
        assert_eq!(out[2].value, 4.0);
        assert_eq!(out[0].ts, 2 * DAY_MS);
    }

    #[test]
    fn test_sma_short_input_empty() {
        assert!(sma(&daily(&[1.0, 2.0]), 3).is_empty());
        assert!(sma(&daily(&[1.0, 2.0]), 0).is_empty());
    }

    #[test]
    fn test_ema_seeded_with_first_value() {
        let series = daily(&[10.0, 20.0]);
        let out = ema(&series, 3);
        assert_eq!(out[0].value, 10.0);
        // alpha = 0.5: 0.5*20 + 0.5*10
        assert!((out[1].value - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_rolling_stddev_constant_is_zero() {
        let series = daily(&[5.0; 10]);
        let out = rolling_stddev(&series, 4);
        assert_eq!(out.len(), 7);
        assert!(out.iter().all(|p| p.value.abs() < 1e-9));
    }

    #[test]
    fn test_rolling_stddev_known_window() {
        let series = daily(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let out = rolling_stddev(&series, 8);
        // Classic population stddev example: sigma = 2
        assert_eq!(out.len(), 1);
        assert!((out[0].value - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_bounds_with_mixed_moves() {
        let mut values = Vec::new();
        for i in 0..40 {
            values.push(100.0 + if i % 2 == 0 { i as f64 } else { -(i as f64) / 2.0 });
        }
        let out = rsi(&daily(&values));
        assert!(!out.is_empty());
        assert!(out.iter().all(|p| p.value >= 0.0 && p.value <= 100.0));
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let values: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&daily(&values));
        assert!(!out.is_empty());
        assert!(out.iter().all(|p| (p.value - 100.0).abs() < 1e-9));
    }

    #[test]
    fn test_rsi_needs_period_plus_one_points() {
        let values: Vec<f64> = (0..RSI_PERIOD as i64).map(|i| i as f64).collect();
        assert!(rsi(&daily(&values)).is_empty());
    }

    #[test]
    fn test_macd_histogram_flat_series_is_zero() {
        let out = macd_histogram(&daily(&[50.0; 60]));
        assert_eq!(out.len(), 60);
        assert!(out.iter().all(|p| p.value.abs() < 1e-9));
    }

    #[test]
    fn test_bollinger_position_flat_band_dropped() {
        // Constant series: zero-width bands everywhere, nothing emitted
        assert!(bollinger_position(&daily(&[10.0; 30])).is_empty());
    }

    #[test]
    fn test_bollinger_position_centered() {
        let values: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 10.0 } else { 12.0 }).collect();
        let out = bollinger_position(&daily(&values));
        assert!(!out.is_empty());
        // Price oscillates symmetrically around the mid band
        assert!(out.iter().all(|p| p.value.abs() <= 100.0));
    }
}
