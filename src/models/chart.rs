use serde::{Deserialize, Serialize};

/// Metric exposed by the asset market-chart provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetMetric {
    Price,
    MarketCap,
    Volume,
}

impl AssetMetric {
    /// Field name in the market-chart payload
    pub fn payload_field(&self) -> &'static str {
        match self {
            AssetMetric::Price => "prices",
            AssetMetric::MarketCap => "market_caps",
            AssetMetric::Volume => "total_volumes",
        }
    }
}

/// Upstream source class for named-series leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesSource {
    /// Macro/economic CSV series
    Macro,
    /// Pre-computed on-chain daily dump
    OnChain,
    /// Sentiment index
    Sentiment,
    /// Network fee history
    NetworkFees,
}

/// Arithmetic combinator for plain derived charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Divide,
    Multiply,
    Add,
    Subtract,
}

impl Operator {
    /// Apply the operator to one aligned pair.
    ///
    /// Division by zero yields `None` so the pair is dropped rather than
    /// emitting an infinity.
    pub fn apply(&self, lhs: f64, rhs: f64) -> Option<f64> {
        match self {
            Operator::Divide => {
                if rhs == 0.0 {
                    None
                } else {
                    Some(lhs / rhs)
                }
            }
            Operator::Multiply => Some(lhs * rhs),
            Operator::Add => Some(lhs + rhs),
            Operator::Subtract => Some(lhs - rhs),
        }
    }
}

/// Named algorithm replacing plain operator evaluation on a derived chart
///
/// Closed set, partitioned into an ROI class (anchored and rolling returns,
/// single dependency) and an indicator class (trend and technical-analysis
/// transforms; correlation is the one member with a second dependency).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpecialTransform {
    // ROI class
    RoiSinceHalving,
    RoiSinceCycleBottom,
    RoiSinceCyclePeak,
    RoiSinceSubCycleBottom,
    /// ROI anchored to a fixed date (epoch milliseconds)
    RoiSinceDate(i64),
    /// Rolling return over a trailing window
    RollingRoi(i64),
    DailyReturn,

    // Indicator class
    Sma(usize),
    Ema(usize),
    RollingStdDev(usize),
    Rsi,
    MacdHistogram,
    BollingerPosition,
    LogTrend,
    LogFairValue,
    RainbowDeviation,
    DrawdownFromPeak,
    RollingCorrelation,
}

impl SpecialTransform {
    /// ROI-class transforms resolve only their left dependency
    pub fn is_roi_class(&self) -> bool {
        matches!(
            self,
            SpecialTransform::RoiSinceHalving
                | SpecialTransform::RoiSinceCycleBottom
                | SpecialTransform::RoiSinceCyclePeak
                | SpecialTransform::RoiSinceSubCycleBottom
                | SpecialTransform::RoiSinceDate(_)
                | SpecialTransform::RollingRoi(_)
                | SpecialTransform::DailyReturn
        )
    }

    /// Correlation is the only transform that resolves a second series
    pub fn needs_secondary(&self) -> bool {
        matches!(self, SpecialTransform::RollingCorrelation)
    }
}

/// Immutable chart definition, identified by a globally unique id
///
/// Either a leaf backed directly by one upstream provider, or a derived node
/// combining two other chart ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChartDefinition {
    /// One tracked asset metric from the market-chart provider
    MarketLeaf {
        asset: String,
        metric: AssetMetric,
        /// Pinned quote currency; `None` follows the caller's request
        currency: Option<String>,
    },
    /// One upstream named series
    SeriesLeaf {
        source: SeriesSource,
        series_id: String,
        /// Maximum lookback the upstream supports
        max_lookback_days: i64,
    },
    /// Combination of two other chart ids
    Derived {
        left: String,
        right: String,
        operator: Operator,
        /// When set, replaces plain operator evaluation
        special: Option<SpecialTransform>,
    },
}

impl ChartDefinition {
    /// Dependency ids of a derived node, in resolution order
    pub fn dependencies(&self) -> Vec<&str> {
        match self {
            ChartDefinition::Derived { left, right, special, .. } => match special {
                Some(st) if st.is_roi_class() => vec![left.as_str()],
                Some(st) if !st.needs_secondary() => vec![left.as_str()],
                _ => vec![left.as_str(), right.as_str()],
            },
            _ => Vec::new(),
        }
    }

    /// Maximum lookback this definition itself supports; derived nodes
    /// defer to the catalog which walks their dependencies.
    pub fn own_max_lookback_days(&self) -> i64 {
        match self {
            ChartDefinition::SeriesLeaf { max_lookback_days, .. } => *max_lookback_days,
            _ => crate::models::Timeframe::Year50.days(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self, ChartDefinition::Derived { .. })
    }

    /// Human-facing kind label for catalog listings
    pub fn kind(&self) -> &'static str {
        match self {
            ChartDefinition::MarketLeaf { .. } => "market-leaf",
            ChartDefinition::SeriesLeaf { .. } => "series-leaf",
            ChartDefinition::Derived { special: Some(st), .. } if st.is_roi_class() => {
                "derived-roi"
            }
            ChartDefinition::Derived { special: Some(_), .. } => "derived-indicator",
            ChartDefinition::Derived { .. } => "derived",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_divide_by_zero_dropped() {
        assert_eq!(Operator::Divide.apply(10.0, 0.0), None);
        assert_eq!(Operator::Divide.apply(10.0, 2.0), Some(5.0));
        assert_eq!(Operator::Subtract.apply(3.0, 5.0), Some(-2.0));
    }

    #[test]
    fn test_roi_class_partition() {
        assert!(SpecialTransform::RoiSinceHalving.is_roi_class());
        assert!(SpecialTransform::RollingRoi(365).is_roi_class());
        assert!(!SpecialTransform::Rsi.is_roi_class());
        assert!(!SpecialTransform::RollingCorrelation.is_roi_class());
        assert!(SpecialTransform::RollingCorrelation.needs_secondary());
        assert!(!SpecialTransform::MacdHistogram.needs_secondary());
    }

    #[test]
    fn test_dependencies_per_class() {
        let roi = ChartDefinition::Derived {
            left: "a".into(),
            right: "a".into(),
            operator: Operator::Divide,
            special: Some(SpecialTransform::RoiSinceHalving),
        };
        assert_eq!(roi.dependencies(), vec!["a"]);

        let corr = ChartDefinition::Derived {
            left: "a".into(),
            right: "b".into(),
            operator: Operator::Divide,
            special: Some(SpecialTransform::RollingCorrelation),
        };
        assert_eq!(corr.dependencies(), vec!["a", "b"]);

        let plain = ChartDefinition::Derived {
            left: "a".into(),
            right: "b".into(),
            operator: Operator::Divide,
            special: None,
        };
        assert_eq!(plain.dependencies(), vec!["a", "b"]);
    }
}
