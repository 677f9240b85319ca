use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported chart zoom levels
///
/// Every resolution request is clamped to one of these buckets so a chart id
/// renders at eight zoom levels without re-deriving from scratch, and so
/// cache keys stay bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    /// Trailing day
    Day1,
    /// Trailing week
    Week1,
    /// Trailing month
    Month1,
    /// Trailing year
    Year1,
    /// Trailing 5 years
    Year5,
    /// Trailing 10 years
    Year10,
    /// Trailing 20 years
    Year20,
    /// Trailing 50 years
    Year50,
}

impl Timeframe {
    /// Window length in days
    pub fn days(&self) -> i64 {
        match self {
            Timeframe::Day1 => 1,
            Timeframe::Week1 => 7,
            Timeframe::Month1 => 30,
            Timeframe::Year1 => 365,
            Timeframe::Year5 => 1825,
            Timeframe::Year10 => 3650,
            Timeframe::Year20 => 7300,
            Timeframe::Year50 => 18250,
        }
    }

    /// Clamp an arbitrary day count to the smallest bucket that covers it.
    /// Day counts past the largest bucket saturate at 50 years.
    pub fn clamp(days: i64) -> Timeframe {
        Timeframe::all()
            .into_iter()
            .find(|tf| tf.days() >= days)
            .unwrap_or(Timeframe::Year50)
    }

    /// Short label used in cache keys and reports
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::Day1 => "1D",
            Timeframe::Week1 => "7D",
            Timeframe::Month1 => "30D",
            Timeframe::Year1 => "1Y",
            Timeframe::Year5 => "5Y",
            Timeframe::Year10 => "10Y",
            Timeframe::Year20 => "20Y",
            Timeframe::Year50 => "50Y",
        }
    }

    /// All buckets, ascending
    pub fn all() -> Vec<Timeframe> {
        vec![
            Timeframe::Day1,
            Timeframe::Week1,
            Timeframe::Month1,
            Timeframe::Year1,
            Timeframe::Year5,
            Timeframe::Year10,
            Timeframe::Year20,
            Timeframe::Year50,
        ]
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Timeframe::Year1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_picks_covering_bucket() {
        assert_eq!(Timeframe::clamp(1), Timeframe::Day1);
        assert_eq!(Timeframe::clamp(2), Timeframe::Week1);
        assert_eq!(Timeframe::clamp(31), Timeframe::Year1);
        assert_eq!(Timeframe::clamp(365), Timeframe::Year1);
        assert_eq!(Timeframe::clamp(400), Timeframe::Year5);
        assert_eq!(Timeframe::clamp(99_999), Timeframe::Year50);
    }

    #[test]
    fn test_all_is_ascending() {
        let buckets = Timeframe::all();
        for pair in buckets.windows(2) {
            assert!(pair[0].days() < pair[1].days());
        }
        assert_eq!(buckets.len(), 8);
    }
}
