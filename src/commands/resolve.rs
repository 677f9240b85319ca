use std::sync::Arc;

use crate::catalog::ChartCatalog;
use crate::commands::resolve_with_retry;
use crate::config::EngineConfig;
use crate::models::Timeframe;
use crate::resolver::Resolver;

pub async fn run(chart_id: &str, days: i64, currency: &str, json: bool) {
    let config = EngineConfig::from_env();
    let catalog = Arc::new(ChartCatalog::builtin());

    if catalog.get(chart_id).is_none() {
        eprintln!("❌ Unknown chart id: {}", chart_id);
        std::process::exit(1);
    }

    let resolver = match Resolver::new(&config, catalog) {
        Ok(resolver) => resolver,
        Err(e) => {
            eprintln!("❌ Failed to build resolver: {}", e);
            std::process::exit(1);
        }
    };

    let timeframe = Timeframe::clamp(days);
    let series = resolve_with_retry(&resolver, chart_id, timeframe, currency).await;

    if json {
        match serde_json::to_string(&series) {
            Ok(body) => println!("{}", body),
            Err(e) => {
                eprintln!("❌ Failed to serialize series: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    println!("📊 {} @ {} ({})\n", chart_id, timeframe, currency);

    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        println!("⚠️  No data after retries. The upstream may be unreachable.");
        return;
    };
    let min = series.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
    let max = series.iter().map(|p| p.value).fold(f64::NEG_INFINITY, f64::max);

    println!("   Points: {:>8}", series.len());
    println!("   Range:  {} → {}", format_ts(first.ts), format_ts(last.ts));
    println!("   First:  {:.4}", first.value);
    println!("   Last:   {:.4}", last.value);
    println!("   Min:    {:.4}", min);
    println!("   Max:    {:.4}", max);
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| ts.to_string())
}
