//! Chart catalog
//!
//! Static registry mapping chart ids to definitions. The engine treats it
//! as read-only. Cycles between derived ids are not rejected at load time
//! (a single bad definition must not take down every other chart in the
//! process); `lint` surfaces them to catalog authors instead, and the
//! resolver guards against them at runtime.

use std::collections::HashMap;

use tracing::info;

use crate::error::{EngineError, Result};
use crate::models::{
    AssetMetric, ChartDefinition, Operator, SeriesSource, SpecialTransform, Timeframe,
};

/// Authoring problems surfaced by [`ChartCatalog::lint`]
#[derive(Debug, Clone, PartialEq)]
pub enum LintIssue {
    /// A derived chart references an id the catalog does not contain
    DanglingReference { chart_id: String, missing: String },
    /// A dependency path returns to its own starting id
    Cycle { path: Vec<String> },
}

impl std::fmt::Display for LintIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LintIssue::DanglingReference { chart_id, missing } => {
                write!(f, "{} references unknown chart '{}'", chart_id, missing)
            }
            LintIssue::Cycle { path } => write!(f, "cycle: {}", path.join(" -> ")),
        }
    }
}

#[derive(Default)]
pub struct ChartCatalog {
    defs: HashMap<String, ChartDefinition>,
}

impl ChartCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. Ids are unique within the catalog.
    pub fn insert(&mut self, id: &str, def: ChartDefinition) -> Result<()> {
        if self.defs.contains_key(id) {
            return Err(EngineError::DuplicateChart(id.to_string()));
        }
        self.defs.insert(id.to_string(), def);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ChartDefinition> {
        self.defs.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Maximum lookback a chart supports: leaves declare their own, derived
    /// charts are bounded by their most constrained dependency. Walks are
    /// depth-limited so a cyclic definition terminates.
    pub fn max_lookback_days(&self, id: &str) -> i64 {
        self.max_lookback_inner(id, 0)
    }

    fn max_lookback_inner(&self, id: &str, depth: u32) -> i64 {
        let widest = Timeframe::Year50.days();
        if depth > crate::constants::MAX_RESOLUTION_DEPTH {
            return widest;
        }
        let Some(def) = self.get(id) else {
            return widest;
        };
        match def {
            ChartDefinition::Derived { .. } => def
                .dependencies()
                .iter()
                .map(|dep| self.max_lookback_inner(dep, depth + 1))
                .min()
                .unwrap_or(widest),
            _ => def.own_max_lookback_days(),
        }
    }

    /// Check every derived definition for dangling references and static
    /// cycles. Purely advisory: the catalog stays usable either way.
    pub fn lint(&self) -> Vec<LintIssue> {
        let mut issues = Vec::new();

        for (id, def) in &self.defs {
            for dep in def.dependencies() {
                if !self.defs.contains_key(dep) {
                    issues.push(LintIssue::DanglingReference {
                        chart_id: id.clone(),
                        missing: dep.to_string(),
                    });
                }
            }
        }

        // DFS from each derived id; self-references count, shared diamonds
        // do not.
        for id in self.defs.keys() {
            let mut path = Vec::new();
            if self.find_cycle(id, id, &mut path, 0) {
                let mut cycle_path = vec![id.clone()];
                cycle_path.extend(path);
                issues.push(LintIssue::Cycle { path: cycle_path });
            }
        }

        issues
    }

    fn find_cycle(&self, origin: &str, current: &str, path: &mut Vec<String>, depth: u32) -> bool {
        if depth > crate::constants::MAX_RESOLUTION_DEPTH {
            return false;
        }
        let Some(def) = self.get(current) else {
            return false;
        };
        for dep in def.dependencies() {
            if dep == origin {
                path.push(dep.to_string());
                return true;
            }
            path.push(dep.to_string());
            if self.find_cycle(origin, dep, path, depth + 1) {
                return true;
            }
            path.pop();
        }
        false
    }

    /// The production chart set
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        let mut add = |id: &str, def: ChartDefinition| {
            catalog
                .insert(id, def)
                .expect("builtin catalog ids are unique");
        };

        // Market leaves
        add("btc-price", market("bitcoin", AssetMetric::Price));
        add("btc-market-cap", market("bitcoin", AssetMetric::MarketCap));
        add("btc-volume", market("bitcoin", AssetMetric::Volume));
        add("eth-price", market("ethereum", AssetMetric::Price));
        add("eth-market-cap", market("ethereum", AssetMetric::MarketCap));

        // Macro series leaves
        add("dxy", series(SeriesSource::Macro, "dx.f", 18_250));
        add("us-m2", series(SeriesSource::Macro, "m2sl", 18_250));
        add("us-cpi", series(SeriesSource::Macro, "cpiaucsl", 18_250));
        add("fed-funds-rate", series(SeriesSource::Macro, "fedfunds", 18_250));
        add("us-10y-yield", series(SeriesSource::Macro, "10usy.b", 7_300));
        add("sp500", series(SeriesSource::Macro, "^spx", 18_250));
        add("gold-spot", series(SeriesSource::Macro, "gold-spot", 18_250));
        add("silver-spot", series(SeriesSource::Macro, "silver-spot", 18_250));

        // On-chain dumps
        add("btc-realized-price", series(SeriesSource::OnChain, "realized-price", 3_650));
        add("btc-mvrv", series(SeriesSource::OnChain, "mvrv", 3_650));
        add("btc-active-addresses", series(SeriesSource::OnChain, "active-addresses", 3_650));
        add("btc-hash-rate", series(SeriesSource::OnChain, "hash-rate", 3_650));

        // Single-endpoint leaves
        add("fear-greed", series(SeriesSource::Sentiment, "fng", 2_555));
        add("btc-fees", series(SeriesSource::NetworkFees, "fee-rates", 1_825));

        // Plain derived ratios and spreads
        add("btc-gold-ratio", derived("btc-price", "gold-spot", Operator::Divide));
        add("btc-sp500-ratio", derived("btc-price", "sp500", Operator::Divide));
        add("btc-m2-ratio", derived("btc-price", "us-m2", Operator::Divide));
        add("eth-btc-ratio", derived("eth-price", "btc-price", Operator::Divide));
        add("btc-real-price", derived("btc-price", "us-cpi", Operator::Divide));
        add("btc-vs-realized", derived("btc-price", "btc-realized-price", Operator::Subtract));

        // ROI class
        add("btc-roi-halving", special("btc-price", SpecialTransform::RoiSinceHalving));
        add("btc-roi-cycle-bottom", special("btc-price", SpecialTransform::RoiSinceCycleBottom));
        add("btc-roi-cycle-peak", special("btc-price", SpecialTransform::RoiSinceCyclePeak));
        add(
            "btc-roi-sub-cycle-bottom",
            special("btc-price", SpecialTransform::RoiSinceSubCycleBottom),
        );
        // 2020-03-12, the COVID liquidity crash
        add(
            "btc-roi-covid-low",
            special("btc-price", SpecialTransform::RoiSinceDate(1_583_971_200_000)),
        );
        add("btc-roi-1y", special("btc-price", SpecialTransform::RollingRoi(365)));
        add("btc-roi-30d", special("btc-price", SpecialTransform::RollingRoi(30)));
        add("btc-daily-return", special("btc-price", SpecialTransform::DailyReturn));
        add("eth-roi-1y", special("eth-price", SpecialTransform::RollingRoi(365)));

        // Indicator class
        add("btc-sma-200", special("btc-price", SpecialTransform::Sma(200)));
        add("btc-sma-50", special("btc-price", SpecialTransform::Sma(50)));
        add("btc-ema-21", special("btc-price", SpecialTransform::Ema(21)));
        add("btc-volatility-30", special("btc-price", SpecialTransform::RollingStdDev(30)));
        add("btc-rsi", special("btc-price", SpecialTransform::Rsi));
        add("btc-macd", special("btc-price", SpecialTransform::MacdHistogram));
        add("btc-bollinger", special("btc-price", SpecialTransform::BollingerPosition));
        add("btc-log-trend", special("btc-price", SpecialTransform::LogTrend));
        add("btc-fair-value", special("btc-price", SpecialTransform::LogFairValue));
        add("btc-rainbow", special("btc-price", SpecialTransform::RainbowDeviation));
        add("btc-drawdown", special("btc-price", SpecialTransform::DrawdownFromPeak));
        add("eth-drawdown", special("eth-price", SpecialTransform::DrawdownFromPeak));
        add(
            "btc-dxy-correlation",
            special_pair("btc-price", "dxy", SpecialTransform::RollingCorrelation),
        );
        add(
            "btc-sp500-correlation",
            special_pair("btc-price", "sp500", SpecialTransform::RollingCorrelation),
        );
        add(
            "btc-gold-correlation",
            special_pair("btc-price", "gold-spot", SpecialTransform::RollingCorrelation),
        );

        info!("Loaded builtin catalog: {} definitions", catalog.len());
        catalog
    }
}

fn market(asset: &str, metric: AssetMetric) -> ChartDefinition {
    ChartDefinition::MarketLeaf {
        asset: asset.to_string(),
        metric,
        currency: None,
    }
}

fn series(source: SeriesSource, series_id: &str, max_lookback_days: i64) -> ChartDefinition {
    ChartDefinition::SeriesLeaf {
        source,
        series_id: series_id.to_string(),
        max_lookback_days,
    }
}

fn derived(left: &str, right: &str, operator: Operator) -> ChartDefinition {
    ChartDefinition::Derived {
        left: left.to_string(),
        right: right.to_string(),
        operator,
        special: None,
    }
}

/// Single-dependency special transform; the right slot repeats the left id
/// to keep both references valid.
fn special(left: &str, transform: SpecialTransform) -> ChartDefinition {
    special_pair(left, left, transform)
}

fn special_pair(left: &str, right: &str, transform: SpecialTransform) -> ChartDefinition {
    ChartDefinition::Derived {
        left: left.to_string(),
        right: right.to_string(),
        operator: Operator::Divide,
        special: Some(transform),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_clean() {
        let catalog = ChartCatalog::builtin();
        assert!(catalog.len() > 30);
        assert!(catalog.lint().is_empty());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut catalog = ChartCatalog::new();
        catalog.insert("a", market("bitcoin", AssetMetric::Price)).unwrap();
        let err = catalog.insert("a", market("ethereum", AssetMetric::Price));
        assert!(matches!(err, Err(EngineError::DuplicateChart(_))));
    }

    #[test]
    fn test_lint_reports_dangling_reference() {
        let mut catalog = ChartCatalog::new();
        catalog.insert("ratio", derived("nope", "ratio2", Operator::Divide)).unwrap();
        let issues = catalog.lint();
        assert_eq!(issues.len(), 2);
        assert!(issues
            .iter()
            .all(|i| matches!(i, LintIssue::DanglingReference { .. })));
    }

    #[test]
    fn test_lint_reports_cycle() {
        let mut catalog = ChartCatalog::new();
        catalog.insert("a", derived("b", "b", Operator::Add)).unwrap();
        catalog.insert("b", derived("a", "a", Operator::Add)).unwrap();
        let issues = catalog.lint();
        assert!(issues.iter().any(|i| matches!(i, LintIssue::Cycle { .. })));
    }

    #[test]
    fn test_max_lookback_follows_most_constrained_dependency() {
        let catalog = ChartCatalog::builtin();
        // Market leaves support the widest window
        assert_eq!(catalog.max_lookback_days("btc-price"), 18_250);
        // A ratio against an on-chain dump is bounded by the dump
        assert_eq!(catalog.max_lookback_days("btc-vs-realized"), 3_650);
        // Unknown ids fall back to the widest window
        assert_eq!(catalog.max_lookback_days("missing"), 18_250);
    }
}
