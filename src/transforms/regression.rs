//! Log-space regression trend
//!
//! Ordinary-least-squares fit of `ln(price)` against `ln(days + 1)`, the
//! long-horizon growth model behind the trend, fair-value and rainbow
//! deviation charts.

use crate::constants::{DAY_MS, LOG_REGRESSION_MIN_POINTS};
use crate::models::{Series, SeriesPoint};

/// The three outputs of one regression fit
#[derive(Debug, Clone, Default)]
pub struct LogRegression {
    /// Fitted trend value at each input timestamp
    pub trend: Series,
    /// Trend discounted by one residual sigma
    pub fair: Series,
    /// Deviation of price from trend, in percent
    pub rainbow: Series,
}

/// Fit the log-regression model over `series`.
///
/// Non-positive and non-finite prices are excluded from the fit. Fewer than
/// 120 usable points returns empty outputs across the board.
pub fn log_regression(series: &Series) -> LogRegression {
    let usable: Series = series
        .iter()
        .filter(|p| p.value.is_finite() && p.value > 0.0)
        .copied()
        .collect();

    if usable.len() < LOG_REGRESSION_MIN_POINTS {
        return LogRegression::default();
    }

    let start_ts = usable[0].ts;
    let xs: Vec<f64> = usable
        .iter()
        .map(|p| (((p.ts - start_ts) as f64 / DAY_MS as f64) + 1.0).ln())
        .collect();
    let ys: Vec<f64> = usable.iter().map(|p| p.value.ln()).collect();

    let n = usable.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x) * (x - mean_x);
    }
    if var_x == 0.0 {
        return LogRegression::default();
    }

    let slope = cov / var_x;
    let intercept = mean_y - slope * mean_x;

    let mut residual_sq = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let r = y - (intercept + slope * x);
        residual_sq += r * r;
    }
    let sigma = (residual_sq / n).sqrt();

    let mut out = LogRegression {
        trend: Vec::with_capacity(usable.len()),
        fair: Vec::with_capacity(usable.len()),
        rainbow: Vec::with_capacity(usable.len()),
    };

    for (p, x) in usable.iter().zip(xs.iter()) {
        let trend = (intercept + slope * x).exp();
        out.trend.push(SeriesPoint::new(p.ts, trend));
        out.fair.push(SeriesPoint::new(p.ts, trend * (-sigma).exp()));
        out.rainbow
            .push(SeriesPoint::new(p.ts, (p.value / trend - 1.0) * 100.0));
    }

    out
}
