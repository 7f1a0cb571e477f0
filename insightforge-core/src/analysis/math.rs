//! Numeric helpers shared by the analysis stages.
//!
//! Degenerate inputs (too few values, zero variance) yield `None` so that the
//! calling stage can simply omit its record.

/// Arithmetic mean, or `None` for an empty slice.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Percentile of pre-sorted values using linear interpolation between order
/// statistics (`p` in [0, 1]).
///
/// The interpolated value is clamped to its bracketing order statistics so
/// that percentiles stay monotone in `p` despite rounding.
pub(crate) fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let position = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let (lo, hi) = (sorted[lower], sorted[upper]);
    if lower == upper || lo == hi {
        return lo;
    }
    let fraction = position - lower as f64;
    let width = hi - lo;
    let value = if width.is_finite() {
        lo + width * fraction
    } else {
        lo * (1.0 - fraction) + hi * fraction
    };
    value.clamp(lo, hi)
}

/// Sorts a copy of the values in ascending order.
pub(crate) fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Largest magnitude in the series, or 1.0 when that is zero.
pub(crate) fn magnitude(values: &[f64]) -> f64 {
    let largest = values.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    if largest > 0.0 { largest } else { 1.0 }
}

/// Pearson correlation coefficient of two equally long series.
///
/// Returns `None` with fewer than two pairs or when either series is constant.
/// Series are divided by their largest magnitude first, which leaves the
/// coefficient unchanged and keeps the products finite.
pub(crate) fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let (scale_x, scale_y) = (magnitude(x), magnitude(y));
    let x: Vec<f64> = x.iter().map(|v| v / scale_x).collect();
    let y: Vec<f64> = y.iter().map(|v| v / scale_y).collect();
    let (x, y) = (x.as_slice(), y.as_slice());
    let mean_x = mean(x)?;
    let mean_y = mean(y)?;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    let r = sxy / (sxx * syy).sqrt();
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Ordinary least-squares fit of values against their index 0..n-1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Correlation coefficient of value against index
    pub r: f64,
}

/// Fits `values[i] = intercept + slope * i`.
///
/// Returns `None` for fewer than two values, a constant series, or a fit
/// whose coefficients are not representable.
pub(crate) fn linear_fit(values: &[f64]) -> Option<LinearFit> {
    let index: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
    let r = pearson(&index, values)?;

    let fit = least_squares(&index, values)
        .filter(|(slope, intercept)| slope.is_finite() && intercept.is_finite())
        .or_else(|| {
            let scale = magnitude(values);
            let scaled: Vec<f64> = values.iter().map(|v| v / scale).collect();
            let (slope, intercept) = least_squares(&index, &scaled)?;
            Some((slope * scale, intercept * scale))
        })
        .filter(|(slope, intercept)| slope.is_finite() && intercept.is_finite())?;

    Some(LinearFit {
        slope: fit.0,
        intercept: fit.1,
        r,
    })
}

/// Slope and intercept of the OLS line through `(x, y)`.
fn least_squares(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let mean_x = mean(x)?;
    let mean_y = mean(y)?;
    let (sxy, sxx) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(sxy, sxx), (a, b)| {
            let dx = a - mean_x;
            (sxy + dx * (b - mean_y), sxx + dx * dx)
        });
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
    }

    #[test]
    fn test_percentile_linear_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        assert!((percentile_sorted(&sorted, 0.25) - 2.25).abs() < 1e-12);
        assert!((percentile_sorted(&sorted, 0.5) - 3.5).abs() < 1e-12);
        assert!((percentile_sorted(&sorted, 0.75) - 4.75).abs() < 1e-12);
        assert_eq!(percentile_sorted(&sorted, 0.0), 1.0);
        assert_eq!(percentile_sorted(&sorted, 1.0), 100.0);
        assert_eq!(percentile_sorted(&[7.0], 0.3), 7.0);
    }

    #[test]
    fn test_percentile_of_equal_values_is_exact() {
        let sorted = [0.1; 7];
        assert_eq!(percentile_sorted(&sorted, 0.25), 0.1);
        assert_eq!(percentile_sorted(&sorted, 0.75), 0.1);
    }

    #[test]
    fn test_pearson_perfect_and_degenerate() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        let z = [8.0, 6.0, 4.0, 2.0];

        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &z).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&x, &[5.0; 4]), None);
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&x, &[1.0, 2.0]), None);
    }

    #[test]
    fn test_pearson_is_symmetric() {
        let x = [1.3, 2.7, 0.4, 9.1, 5.5];
        let y = [3.3, 0.2, 4.4, 8.0, 1.9];
        assert_eq!(pearson(&x, &y), pearson(&y, &x));
    }

    #[test]
    fn test_linear_fit() {
        let values = [1.0, 3.0, 5.0, 7.0, 9.0];
        let fit = linear_fit(&values).unwrap();

        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.r - 1.0).abs() < 1e-12);

        assert!(linear_fit(&[4.0; 12]).is_none());
    }

    #[test]
    fn test_percentile_across_overflowing_span() {
        let sorted = [-f64::MAX, f64::MAX];
        assert_eq!(percentile_sorted(&sorted, 0.5), 0.0);
        assert!(percentile_sorted(&sorted, 0.25).is_finite());
    }

    #[test]
    fn test_pearson_and_fit_of_huge_values() {
        let x = [1e160, 2e160, 3e160, 4e160];
        let y = [2e200, 4e200, 6e200, 8e200];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);

        let fit = linear_fit(&[1e300, 5e307, 1e308]).unwrap();
        assert!(fit.slope.is_finite());
        assert!(fit.intercept.is_finite());
        assert!(fit.r > 0.0);
    }
}
