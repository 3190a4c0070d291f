//! Group Normalization
//!
//! Scales a column by the largest absolute value inside each group, so
//! non-negative inputs land in [0, 1] and signed inputs in [-1, 1].
//!
//! Zero guard: if the group's largest absolute value is exactly 0 every present
//! row of the group normalizes to 0. Missing rows stay missing in every case.

use super::grouping::{gather, Groups};

/// Normalize one group's values by their maximum absolute value
pub fn normalize_max_abs(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let max_abs = values
        .iter()
        .flatten()
        .map(|v| v.abs())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));

    match max_abs {
        None => vec![None; values.len()],
        Some(m) if m == 0.0 => values.iter().map(|v| v.map(|_| 0.0)).collect(),
        Some(m) => values.iter().map(|v| v.map(|x| x / m)).collect(),
    }
}

/// Normalize a full column within each group; row order and count preserved
pub fn group_normalize(values: &[Option<f64>], groups: &Groups) -> Vec<Option<f64>> {
    debug_assert_eq!(values.len(), groups.n_records());
    groups.transform(|members| normalize_max_abs(&gather(values, members)))
}
