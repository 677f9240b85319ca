use serde::{Deserialize, Serialize};

/// A single chart sample
///
/// Serialized as `{x, y}` because that is the shape chart consumers take:
/// `x` is epoch milliseconds, `y` a finite value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Timestamp in epoch milliseconds
    #[serde(rename = "x")]
    pub ts: i64,

    /// Sample value
    #[serde(rename = "y")]
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(ts: i64, value: f64) -> Self {
        Self { ts, value }
    }
}

/// Time-ordered chart series, ascending by timestamp
pub type Series = Vec<SeriesPoint>;

/// Drop non-finite values and sort ascending by timestamp.
///
/// Every provider payload goes through this before anything downstream
/// assumes monotonicity.
pub fn normalize(mut points: Series) -> Series {
    points.retain(|p| p.value.is_finite());
    points.sort_by_key(|p| p.ts);
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_filters_and_sorts() {
        let points = vec![
            SeriesPoint::new(3, 1.0),
            SeriesPoint::new(1, f64::NAN),
            SeriesPoint::new(2, 2.0),
            SeriesPoint::new(1, f64::INFINITY),
            SeriesPoint::new(1, 3.0),
        ];
        let normalized = normalize(points);
        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized[0].ts, 1);
        assert_eq!(normalized[0].value, 3.0);
        assert_eq!(normalized[2].ts, 3);
    }

    #[test]
    fn test_point_serializes_as_xy() {
        let json = serde_json::to_string(&SeriesPoint::new(1000, 2.5)).unwrap();
        assert_eq!(json, r#"{"x":1000,"y":2.5}"#);
    }
}
