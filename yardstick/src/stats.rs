//! Statistics over a set of retained samples.
//!
//! Every function here is total: an empty slice yields `0.0` rather than an error or a NaN, so that
//! an instrument which has not seen any values yet renders as all zeroes.

/// Gets the smallest value, or `0.0` if `values` is empty.
pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

/// Gets the largest value, or `0.0` if `values` is empty.
pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

/// Gets the sum of all values.
pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Gets the arithmetic mean, or `0.0` if `values` is empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    sum(values) / values.len() as f64
}

/// Gets the population variance, or `0.0` if `values` is empty.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mean = mean(values);
    let squared_error: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    squared_error / values.len() as f64
}

/// Gets the population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Gets the value at the given quantile, interpolating between neighbouring ranks.
///
/// `values` are copied and sorted, so the caller's ordering is left untouched.
pub fn percentile(values: &[f64], quantile: f64) -> f64 {
    percentiles(values, &[quantile])[0]
}

/// Gets the values at each of the given quantiles.
///
/// The values are sorted once and every quantile is evaluated against the same sorted copy.  The
/// rank of quantile `q` is `q * (n + 1)`, using one-based ranks: a rank below 1 clamps to the
/// smallest value, a rank at or past `n` clamps to the largest value, and anything in between is
/// linearly interpolated between the two surrounding values.
pub fn percentiles(values: &[f64], quantiles: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return vec![0.0; quantiles.len()];
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);

    quantiles.iter().map(|q| interpolate(&sorted, *q)).collect()
}

fn interpolate(sorted: &[f64], quantile: f64) -> f64 {
    // NaN reads as the smallest quantile.
    let quantile = if quantile.is_nan() { 0.0 } else { quantile.clamp(0.0, 1.0) };
    let len = sorted.len();
    let pos = quantile * (len as f64 + 1.0);

    if pos < 1.0 {
        return sorted[0];
    }
    if pos >= len as f64 {
        return sorted[len - 1];
    }

    let rank = pos.floor();
    let lower = sorted[rank as usize - 1];
    let upper = sorted[rank as usize];
    lower + (pos - rank) * (upper - lower)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_empty_values_are_zero() {
        let empty: [f64; 0] = [];
        assert_eq!(min(&empty), 0.0);
        assert_eq!(max(&empty), 0.0);
        assert_eq!(sum(&empty), 0.0);
        assert_eq!(mean(&empty), 0.0);
        assert_eq!(variance(&empty), 0.0);
        assert_eq!(std_dev(&empty), 0.0);
        assert_eq!(percentile(&empty, 0.5), 0.0);
        assert_eq!(percentiles(&empty, &[0.5, 0.75, 0.99]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_basic_statistics() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(min(&values), 2.0);
        assert_eq!(max(&values), 9.0);
        assert_eq!(sum(&values), 40.0);
        assert_eq!(mean(&values), 5.0);
        assert_eq!(variance(&values), 4.0);
        assert_eq!(std_dev(&values), 2.0);
    }

    #[test]
    fn test_median_on_integral_rank() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(percentile(&values, 0.5), 30.0);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [50.0, 10.0, 40.0, 20.0];
        // pos = 0.5 * 5 = 2.5, halfway between 20 and 40.
        assert_eq!(percentile(&values, 0.5), 30.0);
        // pos = 0.75 * 5 = 3.75, three quarters of the way from 40 to 50.
        assert_relative_eq!(percentile(&values, 0.75), 47.5);
    }

    #[test]
    fn test_percentile_clamps_to_ends() {
        let values = [3.0, 1.0, 2.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 0.1), 1.0);
        assert_eq!(percentile(&values, 0.99), 3.0);
        assert_eq!(percentile(&values, 1.0), 3.0);
    }

    #[test]
    fn test_percentile_out_of_range_quantiles() {
        let values = [3.0, 1.0, 2.0];
        assert_eq!(percentile(&values, f64::NAN), 1.0);
        assert_eq!(percentile(&values, -0.5), 1.0);
        assert_eq!(percentile(&values, f64::NEG_INFINITY), 1.0);
        assert_eq!(percentile(&values, 7.0), 3.0);
        assert_eq!(percentile(&values, f64::INFINITY), 3.0);

        assert_eq!(percentile(&[42.0], f64::NAN), 42.0);
        assert_eq!(percentiles(&values, &[f64::NAN, 0.5]), vec![1.0, 2.0]);
    }

    #[test]
    fn test_percentile_does_not_reorder_input() {
        let values = vec![5.0, 1.0, 4.0, 2.0, 3.0];
        let _ = percentiles(&values, &[0.5, 0.99]);
        assert_eq!(values, vec![5.0, 1.0, 4.0, 2.0, 3.0]);
    }

    proptest! {
        #[test]
        fn test_percentiles_match_single_percentile(
            values in prop::collection::vec(-1.0e6f64..1.0e6, 1..200),
            quantiles in prop::collection::vec(0.0f64..=1.0, 1..10),
        ) {
            let batch = percentiles(&values, &quantiles);
            for (q, value) in quantiles.iter().zip(batch) {
                prop_assert_eq!(percentile(&values, *q), value);
            }
        }

        #[test]
        fn test_percentile_within_bounds(
            values in prop::collection::vec(-1.0e6f64..1.0e6, 1..200),
            q in 0.0f64..=1.0,
        ) {
            let p = percentile(&values, q);
            prop_assert!(p >= min(&values) - 1.0e-6);
            prop_assert!(p <= max(&values) + 1.0e-6);
        }
    }
}
