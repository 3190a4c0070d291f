//! Descriptive statistics over columns with missing values
//!
//! Missing entries (`None`) are skipped, matching the way a dataframe library
//! ignores nulls in aggregations. Undefined results (empty input, a single
//! observation for a sample standard deviation) are `None`; callers decide the
//! fallback.

/// Mean of the present values
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values.into_iter().flatten() {
        sum += v;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Sample standard deviation (n - 1 denominator) of the present values
pub fn sample_std<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values.into_iter().flatten().collect();
    if present.len() < 2 {
        return None;
    }
    let n = present.len() as f64;
    let m = present.iter().sum::<f64>() / n;
    let ss: f64 = present.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (n - 1.0)).sqrt())
}

/// Quantile with linear interpolation between order statistics
///
/// Position is `q * (n - 1)` over the sorted present values; the result
/// interpolates between the two bracketing order statistics.
pub fn quantile<I>(values: I, q: f64) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut sorted: Vec<f64> = values.into_iter().flatten().collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let fraction = pos - lo as f64;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * fraction)
}

/// Trailing rolling sample standard deviation
///
/// Entry `i` covers positions `i + 1 - window ..= i`. A value is produced only
/// when the window holds at least `min_periods` present observations.
pub fn rolling_std(values: &[Option<f64>], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    let min_periods = min_periods.max(1);

    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            let present = slice.iter().filter(|v| v.is_some()).count();
            if present < min_periods {
                None
            } else {
                sample_std(slice.iter().copied())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_mean_skips_missing() {
        let values = vec![Some(1.0), None, Some(3.0)];
        assert_relative_eq!(mean(values).unwrap(), 2.0);
        assert_eq!(mean(vec![None, None]), None);
    }

    #[test]
    fn test_sample_std() {
        let values = some(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        // Sum of squares 32 over 7
        assert_relative_eq!(sample_std(values).unwrap(), (32.0f64 / 7.0).sqrt(), epsilon = 1e-12);
        assert_eq!(sample_std(some(&[5.0])), None);
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let values = some(&[20.0, 22.0, 24.0, 26.0, 28.0]);
        // pos = 0.9 * 4 = 3.6 -> 26 + 0.6 * 2
        assert_relative_eq!(quantile(values.clone(), 0.9).unwrap(), 27.2, epsilon = 1e-12);
        // pos = 0.1 * 4 = 0.4 -> 20 + 0.4 * 2
        assert_relative_eq!(quantile(values.clone(), 0.1).unwrap(), 20.8, epsilon = 1e-12);
        assert_relative_eq!(quantile(values.clone(), 0.5).unwrap(), 24.0);
        assert_relative_eq!(quantile(values, 1.0).unwrap(), 28.0);
    }

    #[test]
    fn test_quantile_unsorted_input_and_missing() {
        let values = vec![Some(3.0), None, Some(1.0), Some(2.0)];
        assert_relative_eq!(quantile(values, 0.5).unwrap(), 2.0);
        assert_eq!(quantile(Vec::<Option<f64>>::new(), 0.5), None);
    }

    #[test]
    fn test_rolling_std_requires_min_periods() {
        let values = some(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let rolled = rolling_std(&values, 5, 3);
        assert_eq!(rolled[0], None);
        assert_eq!(rolled[1], None);
        assert_relative_eq!(rolled[2].unwrap(), 1.0, epsilon = 1e-12);
        // Window of 5: [2..6], std = sqrt(2.5)
        assert_relative_eq!(rolled[5].unwrap(), 2.5f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_rolling_std_counts_present_values_only() {
        let values = vec![Some(1.0), None, Some(3.0), None];
        let rolled = rolling_std(&values, 5, 3);
        assert!(rolled.iter().all(|v| v.is_none()));
    }
}
