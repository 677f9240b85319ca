//! Carry-forward aligning merge
//!
//! Combines two series of different native sampling frequency by holding
//! the last-known value of the right series constant between its samples.

use crate::models::{Operator, Series, SeriesPoint};

/// Merge `left` and `right` with `op`, aligned on `left`'s timestamps.
///
/// For each left point the cursor advances to the latest right point whose
/// timestamp is not after it; left points before the first right sample are
/// skipped. Division by zero and non-finite results are dropped.
pub fn merge(left: &Series, right: &Series, op: Operator) -> Series {
    if right.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(left.len());
    let mut cursor = 0usize;
    let mut carried: Option<f64> = None;

    for lp in left {
        while cursor < right.len() && right[cursor].ts <= lp.ts {
            carried = Some(right[cursor].value);
            cursor += 1;
        }
        let Some(rv) = carried else { continue };
        if let Some(v) = op.apply(lp.value, rv) {
            if v.is_finite() {
                out.push(SeriesPoint::new(lp.ts, v));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DAY_MS;

    fn pts(values: &[(i64, f64)]) -> Series {
        values.iter().map(|&(ts, v)| SeriesPoint::new(ts, v)).collect()
    }

    #[test]
    fn test_merge_divide() {
        let left = pts(&[(1000, 10.0)]);
        let right = pts(&[(1000, 2.0)]);
        let merged = merge(&left, &right, Operator::Divide);
        assert_eq!(merged, pts(&[(1000, 5.0)]));
    }

    #[test]
    fn test_merge_divide_by_zero_dropped() {
        let left = pts(&[(1000, 10.0)]);
        let right = pts(&[(1000, 0.0)]);
        assert!(merge(&left, &right, Operator::Divide).is_empty());
    }

    #[test]
    fn test_merge_empty_right_is_empty() {
        let left = pts(&[(1000, 10.0), (2000, 20.0)]);
        assert!(merge(&left, &Vec::new(), Operator::Add).is_empty());
    }

    #[test]
    fn test_merge_carries_sparse_right_forward() {
        // Daily left against a "monthly" right: the right value holds
        // between its own samples.
        let left = pts(&[
            (0, 1.0),
            (DAY_MS, 2.0),
            (2 * DAY_MS, 3.0),
            (32 * DAY_MS, 4.0),
        ]);
        let right = pts(&[(0, 10.0), (30 * DAY_MS, 20.0)]);
        let merged = merge(&left, &right, Operator::Multiply);
        assert_eq!(
            merged,
            pts(&[
                (0, 10.0),
                (DAY_MS, 20.0),
                (2 * DAY_MS, 30.0),
                (32 * DAY_MS, 80.0),
            ])
        );
    }

    #[test]
    fn test_merge_skips_left_points_before_right_starts() {
        let left = pts(&[(0, 1.0), (DAY_MS, 2.0), (2 * DAY_MS, 3.0)]);
        let right = pts(&[(DAY_MS, 5.0)]);
        let merged = merge(&left, &right, Operator::Add);
        assert_eq!(merged, pts(&[(DAY_MS, 7.0), (2 * DAY_MS, 8.0)]));
    }
}
