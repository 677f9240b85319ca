//! Rolling statistics
//!
//! Drawdown from the running peak and rolling Pearson correlation between
//! two carry-forward aligned series.

use crate::constants::CORRELATION_WINDOW;
use crate::models::{Series, SeriesPoint};

/// Percentage distance from the running maximum. Never positive.
pub fn drawdown_from_peak(series: &Series) -> Series {
    let mut peak = f64::NEG_INFINITY;
    let mut out = Vec::with_capacity(series.len());

    for p in series {
        peak = peak.max(p.value);
        if peak > 0.0 {
            out.push(SeriesPoint::new(p.ts, (p.value / peak - 1.0) * 100.0));
        }
    }

    out
}

/// Rolling Pearson correlation of the two series' own daily returns over a
/// trailing 90-return window.
///
/// The right series is carry-forward aligned onto the left's timestamps
/// first; zero-variance windows are skipped.
pub fn rolling_correlation(left: &Series, right: &Series) -> Series {
    let aligned = align(left, right);
    if aligned.len() < 2 {
        return Vec::new();
    }

    // Paired point-over-point returns at each aligned timestamp
    let mut returns: Vec<(i64, f64, f64)> = Vec::with_capacity(aligned.len() - 1);
    for w in aligned.windows(2) {
        let (_, la, ra) = w[0];
        let (ts, lb, rb) = w[1];
        if la == 0.0 || ra == 0.0 {
            continue;
        }
        returns.push((ts, lb / la - 1.0, rb / ra - 1.0));
    }

    let window = CORRELATION_WINDOW;
    if returns.len() < window {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(returns.len() - window + 1);
    for end in window..=returns.len() {
        let slice = &returns[end - window..end];
        if let Some(r) = pearson(slice) {
            out.push(SeriesPoint::new(slice[window - 1].0, r));
        }
    }

    out
}

/// Latest right value at or before each left timestamp
fn align(left: &Series, right: &Series) -> Vec<(i64, f64, f64)> {
    let mut out = Vec::with_capacity(left.len());
    let mut cursor = 0usize;
    let mut carried: Option<f64> = None;

    for lp in left {
        while cursor < right.len() && right[cursor].ts <= lp.ts {
            carried = Some(right[cursor].value);
            cursor += 1;
        }
        if let Some(rv) = carried {
            out.push((lp.ts, lp.value, rv));
        }
    }

    out
}

fn pearson(pairs: &[(i64, f64, f64)]) -> Option<f64> {
    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|p| p.2).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for p in pairs {
        let da = p.1 - mean_a;
        let db = p.2 - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
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
    fn test_drawdown_never_positive() {
        let series = daily(&[100.0, 120.0, 80.0, 130.0, 90.0]);
        let out = drawdown_from_peak(&series);
        assert_eq!(out.len(), 5);
        assert!(out.iter().all(|p| p.value <= 0.0));
        assert_eq!(out[1].value, 0.0);
        assert!((out[2].value + (1.0 - 80.0 / 120.0) * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_perfectly_correlated_series() {
        let count = CORRELATION_WINDOW + 20;
        let a: Vec<f64> = (0..count).map(|i| 100.0 + (i as f64 * 0.7).sin() * 10.0).collect();
        let b: Vec<f64> = a.iter().map(|v| v * 3.0).collect();
        let out = rolling_correlation(&daily(&a), &daily(&b));
        assert!(!out.is_empty());
        for p in &out {
            assert!((p.value - 1.0).abs() < 1e-9, "corr {} at {}", p.value, p.ts);
        }
    }

    #[test]
    fn test_anti_correlated_series_bounded() {
        let count = CORRELATION_WINDOW + 5;
        let a: Vec<f64> = (0..count).map(|i| 100.0 + (i as f64 * 1.3).sin() * 5.0).collect();
        let b: Vec<f64> = (0..count).map(|i| 200.0 - (i as f64 * 1.3).sin() * 5.0).collect();
        let out = rolling_correlation(&daily(&a), &daily(&b));
        assert!(!out.is_empty());
        assert!(out.iter().all(|p| p.value >= -1.0 - 1e-9 && p.value <= 1.0 + 1e-9));
        assert!(out.iter().all(|p| p.value < 0.0));
    }

    #[test]
    fn test_zero_variance_window_skipped() {
        let count = CORRELATION_WINDOW + 5;
        let a: Vec<f64> = vec![100.0; count];
        let b: Vec<f64> = (0..count).map(|i| 100.0 + i as f64).collect();
        assert!(rolling_correlation(&daily(&a), &daily(&b)).is_empty());
    }

    #[test]
    fn test_correlation_empty_right() {
        let a = daily(&[1.0, 2.0, 3.0]);
        assert!(rolling_correlation(&a, &Vec::new()).is_empty());
    }
}
