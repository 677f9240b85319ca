//! Batch catalog validation
//!
//! Resolves every catalog id at every timeframe for N passes, recording
//! point-count failures and sanity-range violations to a machine-readable
//! report. This is the same engine path the renderer uses; the sweep exists
//! so catalog edits and provider drift are caught before users see broken
//! charts.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::cache::SeriesCache;
use crate::catalog::ChartCatalog;
use crate::commands::resolve_with_retry;
use crate::config::EngineConfig;
use crate::constants::RENDERABLE_MIN_POINTS;
use crate::models::{ChartDefinition, Series, SpecialTransform, Timeframe};
use crate::resolver::Resolver;

#[derive(Debug, Serialize)]
pub struct SweepReport {
    pub generated_at: String,
    pub passes: u32,
    pub charts: usize,
    pub timeframes: usize,
    pub total_checks: usize,
    pub failures: Vec<SweepFailure>,
}

#[derive(Debug, Serialize)]
pub struct SweepFailure {
    pub chart_id: String,
    pub timeframe: String,
    pub pass: u32,
    pub kind: FailureKind,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InsufficientPoints,
    RangeViolation,
}

pub async fn run(passes: u32, out: Option<PathBuf>) {
    let config = EngineConfig::from_env();
    let catalog = Arc::new(ChartCatalog::builtin());
    let cache = Arc::new(SeriesCache::new(&config));

    let resolver = match Resolver::with_cache(&config, catalog.clone(), cache) {
        Ok(resolver) => resolver,
        Err(e) => {
            eprintln!("❌ Failed to build resolver: {}", e);
            std::process::exit(1);
        }
    };

    let timeframes = Timeframe::all();
    let mut ids: Vec<String> = catalog.ids().map(String::from).collect();
    ids.sort();

    println!(
        "🔍 Sweeping {} charts × {} timeframes × {} pass(es)...\n",
        ids.len(),
        timeframes.len(),
        passes
    );

    let mut report = SweepReport {
        generated_at: Utc::now().to_rfc3339(),
        passes,
        charts: ids.len(),
        timeframes: timeframes.len(),
        total_checks: 0,
        failures: Vec::new(),
    };

    for pass in 0..passes {
        for chart_id in &ids {
            for &timeframe in &timeframes {
                report.total_checks += 1;
                let series = resolve_with_retry(&resolver, chart_id, timeframe, "usd").await;
                check_series(&catalog, chart_id, timeframe, pass, &series, &mut report.failures);
            }
        }
        println!(
            "   Pass {}/{} complete: {} failure(s) so far",
            pass + 1,
            passes,
            report.failures.len()
        );
    }

    println!("\n═══════════════════════════════════════════");
    if report.failures.is_empty() {
        println!("✅ All {} checks passed", report.total_checks);
    } else {
        println!(
            "⚠️  {} of {} checks failed",
            report.failures.len(),
            report.total_checks
        );
        for failure in report.failures.iter().take(20) {
            println!(
                "   {} @ {} (pass {}): {}",
                failure.chart_id, failure.timeframe, failure.pass, failure.detail
            );
        }
        if report.failures.len() > 20 {
            println!("   ... and {} more", report.failures.len() - 20);
        }
    }

    let body = match serde_json::to_string_pretty(&report) {
        Ok(body) => body,
        Err(e) => {
            eprintln!("❌ Failed to serialize report: {}", e);
            std::process::exit(1);
        }
    };

    match out {
        Some(path) => {
            if let Err(e) = tokio::fs::write(&path, body).await {
                eprintln!("❌ Failed to write {}: {}", path.display(), e);
                std::process::exit(1);
            }
            println!("\n💾 Report written to {}", path.display());
        }
        None => println!("\n{}", body),
    }
}

/// Point-count check plus the per-transform sanity ranges
fn check_series(
    catalog: &ChartCatalog,
    chart_id: &str,
    timeframe: Timeframe,
    pass: u32,
    series: &Series,
    failures: &mut Vec<SweepFailure>,
) {
    let mut fail = |kind: FailureKind, detail: String| {
        failures.push(SweepFailure {
            chart_id: chart_id.to_string(),
            timeframe: timeframe.label().to_string(),
            pass,
            kind,
            detail,
        });
    };

    if series.len() < RENDERABLE_MIN_POINTS {
        fail(
            FailureKind::InsufficientPoints,
            format!("{} point(s) after retries", series.len()),
        );
        return;
    }

    let special = match catalog.get(chart_id) {
        Some(ChartDefinition::Derived { special: Some(st), .. }) => *st,
        _ => return,
    };

    let bounds: Option<(f64, f64)> = match special {
        SpecialTransform::Rsi => Some((-1.0, 101.0)),
        SpecialTransform::RollingCorrelation => Some((-1.05, 1.05)),
        SpecialTransform::DrawdownFromPeak => Some((f64::NEG_INFINITY, 1e-9)),
        _ => None,
    };

    if let Some((lo, hi)) = bounds {
        for point in series {
            if point.value < lo || point.value > hi {
                fail(
                    FailureKind::RangeViolation,
                    format!("value {} outside [{}, {}]", point.value, lo, hi),
                );
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeriesPoint;

    fn catalog_with_special(id: &str, special: SpecialTransform) -> ChartCatalog {
        let mut catalog = ChartCatalog::new();
        catalog
            .insert(
                "base",
                ChartDefinition::MarketLeaf {
                    asset: "bitcoin".to_string(),
                    metric: crate::models::AssetMetric::Price,
                    currency: None,
                },
            )
            .unwrap();
        catalog
            .insert(
                id,
                ChartDefinition::Derived {
                    left: "base".to_string(),
                    right: "base".to_string(),
                    operator: crate::models::Operator::Divide,
                    special: Some(special),
                },
            )
            .unwrap();
        catalog
    }

    #[test]
    fn test_short_series_is_flagged() {
        let catalog = ChartCatalog::new();
        let mut failures = Vec::new();
        let series = vec![SeriesPoint::new(0, 1.0)];
        check_series(&catalog, "x", Timeframe::Day1, 0, &series, &mut failures);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, FailureKind::InsufficientPoints);
    }

    #[test]
    fn test_rsi_out_of_range_is_flagged() {
        let catalog = catalog_with_special("rsi", SpecialTransform::Rsi);
        let mut failures = Vec::new();
        let series = vec![SeriesPoint::new(0, 50.0), SeriesPoint::new(1, 150.0)];
        check_series(&catalog, "rsi", Timeframe::Day1, 0, &series, &mut failures);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, FailureKind::RangeViolation);
    }

    #[test]
    fn test_positive_drawdown_is_flagged() {
        let catalog = catalog_with_special("dd", SpecialTransform::DrawdownFromPeak);
        let mut failures = Vec::new();
        let series = vec![SeriesPoint::new(0, -5.0), SeriesPoint::new(1, 0.5)];
        check_series(&catalog, "dd", Timeframe::Day1, 0, &series, &mut failures);
        assert_eq!(failures.len(), 1);
    }

    #[test]
    fn test_in_range_series_passes() {
        let catalog = catalog_with_special("corr", SpecialTransform::RollingCorrelation);
        let mut failures = Vec::new();
        let series = vec![SeriesPoint::new(0, -0.8), SeriesPoint::new(1, 0.9)];
        check_series(&catalog, "corr", Timeframe::Day1, 0, &series, &mut failures);
        assert!(failures.is_empty());
    }
}
