//! DAG resolver
//!
//! The orchestrator behind every chart render: looks up the definition,
//! delegates leaves to their provider adapter, expands derived nodes with
//! the lookback their transform needs, and canonicalizes the result to the
//! caller's window. No failure mode crosses this boundary; everything
//! degrades to a shorter (possibly empty) series.

mod lookback;

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::cache::SeriesCache;
use crate::catalog::ChartCatalog;
use crate::config::EngineConfig;
use crate::constants::{
    MARKET_MAX_GAP_MS, MARKET_MIN_GAP_MS, MAX_RESOLUTION_DEPTH, RENDERABLE_MIN_POINTS,
};
use crate::error::Result;
use crate::models::{ChartDefinition, Series, SeriesSource, Timeframe};
use crate::providers::{
    FeeProvider, HttpFetcher, MacroSeriesProvider, MarketChartProvider, OnChainDumpProvider,
    RateGate, SentimentProvider,
};
use crate::transforms;
use crate::window;

pub struct Resolver {
    catalog: Arc<ChartCatalog>,
    cache: Arc<SeriesCache>,
    market: MarketChartProvider,
    macro_series: MacroSeriesProvider,
    onchain: OnChainDumpProvider,
    sentiment: SentimentProvider,
    fees: FeeProvider,
}

impl Resolver {
    pub fn new(config: &EngineConfig, catalog: Arc<ChartCatalog>) -> Result<Self> {
        let cache = Arc::new(SeriesCache::new(config));
        Self::with_cache(config, catalog, cache)
    }

    /// Construct around an existing cache (tests seed it; the batch sweep
    /// shares one across passes).
    pub fn with_cache(
        config: &EngineConfig,
        catalog: Arc<ChartCatalog>,
        cache: Arc<SeriesCache>,
    ) -> Result<Self> {
        let http = Arc::new(HttpFetcher::new(config)?);
        let gate = Arc::new(RateGate::new(
            Duration::from_millis(MARKET_MIN_GAP_MS),
            Duration::from_millis(MARKET_MAX_GAP_MS),
        ));

        Ok(Self {
            catalog,
            market: MarketChartProvider::new(http.clone(), cache.clone(), gate),
            macro_series: MacroSeriesProvider::new(http.clone(), cache.clone()),
            onchain: OnChainDumpProvider::new(http.clone(), cache.clone()),
            sentiment: SentimentProvider::new(http.clone(), cache.clone()),
            fees: FeeProvider::new(http, cache.clone()),
            cache,
        })
    }

    pub fn catalog(&self) -> &ChartCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &Arc<SeriesCache> {
        &self.cache
    }

    /// Resolve one chart id to an ordered series over the requested window.
    ///
    /// Never fails and never panics; a chart with no reachable data
    /// resolves to an empty series.
    pub async fn resolve(&self, chart_id: &str, timeframe: Timeframe, currency: &str) -> Series {
        self.resolve_inner(chart_id, timeframe, currency, 0, HashSet::new())
            .await
    }

    /// Recursive resolution step.
    ///
    /// `visited` is the set of ids on the current path, cloned into each
    /// branch so sibling branches sharing a dependency do not block each
    /// other; `depth` is the defensive ceiling on top of that.
    fn resolve_inner<'a>(
        &'a self,
        chart_id: &'a str,
        timeframe: Timeframe,
        currency: &'a str,
        depth: u32,
        visited: HashSet<String>,
    ) -> Pin<Box<dyn Future<Output = Series> + Send + 'a>> {
        Box::pin(async move {
            if depth > MAX_RESOLUTION_DEPTH {
                warn!("Resolution depth exceeded at {}", chart_id);
                return Vec::new();
            }
            if visited.contains(chart_id) {
                warn!("Cycle detected at {}, returning empty", chart_id);
                return Vec::new();
            }
            let Some(def) = self.catalog.get(chart_id) else {
                warn!("Unknown chart id: {}", chart_id);
                return Vec::new();
            };

            let key = SeriesCache::resolved_key(chart_id, currency, timeframe);
            if let Some(series) = self.cache.fresh(&key).await {
                return series;
            }

            let mut visited = visited;
            visited.insert(chart_id.to_string());
            let now_ms = Utc::now().timestamp_millis();

            let series = match def {
                ChartDefinition::MarketLeaf { asset, metric, currency: pinned } => {
                    let quote = pinned.as_deref().unwrap_or(currency);
                    self.market.fetch(asset, *metric, quote, timeframe).await
                }

                ChartDefinition::SeriesLeaf { source, series_id, .. } => match source {
                    SeriesSource::Macro => self.macro_series.fetch(series_id, timeframe).await,
                    SeriesSource::OnChain => self.onchain.fetch(series_id, timeframe).await,
                    SeriesSource::Sentiment => self.sentiment.fetch(timeframe).await,
                    SeriesSource::NetworkFees => self.fees.fetch(timeframe).await,
                },

                ChartDefinition::Derived { left, right, operator, special } => match special {
                    Some(st) if st.is_roi_class() => {
                        let effective = st.effective_timeframe(timeframe);
                        let base = self
                            .resolve_inner(left, effective, currency, depth + 1, visited.clone())
                            .await;
                        window::limit(st.apply(&base, None), timeframe.days(), now_ms)
                    }
                    Some(st) => {
                        let effective = st.effective_timeframe(timeframe);
                        let primary = self
                            .resolve_inner(left, effective, currency, depth + 1, visited.clone())
                            .await;
                        let secondary = if st.needs_secondary() {
                            Some(
                                self.resolve_inner(
                                    right,
                                    effective,
                                    currency,
                                    depth + 1,
                                    visited.clone(),
                                )
                                .await,
                            )
                        } else {
                            None
                        };
                        window::limit(
                            st.apply(&primary, secondary.as_ref()),
                            timeframe.days(),
                            now_ms,
                        )
                    }
                    None => {
                        // Independent branches: resolve both sides together
                        let (l, r) = tokio::join!(
                            self.resolve_inner(
                                left,
                                timeframe,
                                currency,
                                depth + 1,
                                visited.clone()
                            ),
                            self.resolve_inner(
                                right,
                                timeframe,
                                currency,
                                depth + 1,
                                visited.clone()
                            ),
                        );
                        transforms::merge(&l, &r, *operator)
                    }
                },
            };

            let series = window::ensure_renderable(series);
            if series.len() >= RENDERABLE_MIN_POINTS {
                self.cache.store(&key, series.clone()).await;
                series
            } else if let Some(stale) = self.cache.stale(&key).await {
                debug!("Serving stale series for {} after short resolution", chart_id);
                stale
            } else {
                series
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DAY_MS;
    use crate::models::{AssetMetric, Operator, SeriesPoint, SpecialTransform};

    fn market_leaf(asset: &str) -> ChartDefinition {
        ChartDefinition::MarketLeaf {
            asset: asset.to_string(),
            metric: AssetMetric::Price,
            currency: None,
        }
    }

    fn plain(left: &str, right: &str, operator: Operator) -> ChartDefinition {
        ChartDefinition::Derived {
            left: left.to_string(),
            right: right.to_string(),
            operator,
            special: None,
        }
    }

    fn resolver_with(catalog: ChartCatalog) -> Resolver {
        Resolver::new(&EngineConfig::default(), Arc::new(catalog)).unwrap()
    }

    fn recent_daily(count: i64, base: f64) -> Series {
        let now = Utc::now().timestamp_millis();
        (0..count)
            .map(|i| SeriesPoint::new(now - (count - 1 - i) * DAY_MS, base + i as f64))
            .collect()
    }

    #[tokio::test]
    async fn test_cycle_resolves_to_empty() {
        let mut catalog = ChartCatalog::new();
        catalog.insert("a", plain("b", "b", Operator::Add)).unwrap();
        catalog.insert("b", plain("a", "a", Operator::Add)).unwrap();
        let resolver = resolver_with(catalog);

        assert!(resolver.resolve("a", Timeframe::Year1, "usd").await.is_empty());
    }

    #[tokio::test]
    async fn test_depth_ceiling_resolves_to_empty() {
        let mut catalog = ChartCatalog::new();
        for i in 0..13 {
            let next = format!("c{}", i + 1);
            catalog
                .insert(&format!("c{}", i), plain(&next, &next, Operator::Add))
                .unwrap();
        }
        catalog.insert("c13", market_leaf("bitcoin")).unwrap();
        let resolver = resolver_with(catalog);

        assert!(resolver.resolve("c0", Timeframe::Year1, "usd").await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_chart_resolves_to_empty() {
        let resolver = resolver_with(ChartCatalog::new());
        assert!(resolver.resolve("nope", Timeframe::Year1, "usd").await.is_empty());
    }

    #[tokio::test]
    async fn test_plain_derived_merges_cached_leaves() {
        let mut catalog = ChartCatalog::new();
        catalog.insert("x", market_leaf("bitcoin")).unwrap();
        catalog.insert("y", market_leaf("ethereum")).unwrap();
        catalog.insert("ratio", plain("x", "y", Operator::Divide)).unwrap();
        let resolver = resolver_with(catalog);

        let tf = Timeframe::Month1;
        let left = recent_daily(10, 100.0);
        let right: Series = left.iter().map(|p| SeriesPoint::new(p.ts, 2.0)).collect();
        resolver
            .cache()
            .store(&SeriesCache::resolved_key("x", "usd", tf), left.clone())
            .await;
        resolver
            .cache()
            .store(&SeriesCache::resolved_key("y", "usd", tf), right)
            .await;

        let out = resolver.resolve("ratio", tf, "usd").await;
        assert_eq!(out.len(), 10);
        for (i, p) in out.iter().enumerate() {
            assert!((p.value - left[i].value / 2.0).abs() < 1e-9);
        }

        // The derived result is memoized at its own key
        let memo = resolver
            .cache()
            .fresh(&SeriesCache::resolved_key("ratio", "usd", tf))
            .await;
        assert!(memo.is_some());
    }

    #[tokio::test]
    async fn test_indicator_uses_inflated_dependency_window() {
        let mut catalog = ChartCatalog::new();
        catalog.insert("price", market_leaf("bitcoin")).unwrap();
        catalog
            .insert(
                "returns",
                ChartDefinition::Derived {
                    left: "price".to_string(),
                    right: "price".to_string(),
                    operator: Operator::Divide,
                    special: Some(SpecialTransform::DailyReturn),
                },
            )
            .unwrap();
        let resolver = resolver_with(catalog);

        // The dependency is requested at the inflated bucket, not Day1
        let effective = SpecialTransform::DailyReturn.effective_timeframe(Timeframe::Day1);
        assert_eq!(effective, Timeframe::Week1);
        resolver
            .cache()
            .store(
                &SeriesCache::resolved_key("price", "usd", effective),
                recent_daily(8, 100.0),
            )
            .await;

        let out = resolver.resolve("returns", Timeframe::Day1, "usd").await;
        assert!(!out.is_empty());
        assert!(out.iter().all(|p| p.value.is_finite()));
    }

    #[tokio::test]
    async fn test_shared_dependency_does_not_trip_cycle_guard() {
        // Diamond: top depends on two ratios that both read the same leaf
        let mut catalog = ChartCatalog::new();
        catalog.insert("leaf", market_leaf("bitcoin")).unwrap();
        catalog.insert("r1", plain("leaf", "leaf", Operator::Add)).unwrap();
        catalog.insert("r2", plain("leaf", "leaf", Operator::Multiply)).unwrap();
        catalog.insert("top", plain("r1", "r2", Operator::Subtract)).unwrap();
        let resolver = resolver_with(catalog);

        let tf = Timeframe::Month1;
        resolver
            .cache()
            .store(
                &SeriesCache::resolved_key("leaf", "usd", tf),
                recent_daily(5, 10.0),
            )
            .await;

        let out = resolver.resolve("top", tf, "usd").await;
        // r1 = 2v, r2 = v^2, top = 2v - v^2; all five points survive
        assert_eq!(out.len(), 5);
    }
}
