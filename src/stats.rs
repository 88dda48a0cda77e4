//! Population statistics shared by every detector.
//!
//! All variance figures divide by N, never N-1, so cohort, grader and
//! criterion statistics stay comparable.

/// Empty input yields `(0.0, 0.0)`.
pub fn mean_and_std_dev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }

    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let variance = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / count;
    (mean, variance.sqrt())
}

/// Divides, returning `default` whenever the result would be NaN or infinite.
pub fn safe_ratio(numerator: f64, denominator: f64, default: f64) -> f64 {
    if denominator == 0.0 {
        return default;
    }

    let ratio = numerator / denominator;
    if ratio.is_finite() {
        ratio
    } else {
        default
    }
}

pub fn z_score(value: f64, mean: f64, std_dev: f64) -> f64 {
    safe_ratio(value - mean, std_dev, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(mean_and_std_dev(&[]), (0.0, 0.0));
    }

    #[test]
    fn uses_population_variance() {
        let (mean, std_dev) = mean_and_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((mean - 5.0).abs() < 1e-12);
        // Sample variance would give ~2.138 here.
        assert!((std_dev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn single_value_has_no_spread() {
        let (mean, std_dev) = mean_and_std_dev(&[72.5]);
        assert_eq!(mean, 72.5);
        assert_eq!(std_dev, 0.0);
    }

    #[test]
    fn safe_ratio_falls_back_on_zero_and_overflow() {
        assert_eq!(safe_ratio(3.0, 0.0, -1.0), -1.0);
        assert_eq!(safe_ratio(f64::MAX, f64::MIN_POSITIVE, 0.0), 0.0);
        assert_eq!(safe_ratio(6.0, 3.0, 0.0), 2.0);
    }

    #[test]
    fn z_score_without_spread_is_zero() {
        assert_eq!(z_score(90.0, 80.0, 0.0), 0.0);
        assert!((z_score(70.0, 80.0, 5.0) + 2.0).abs() < 1e-12);
    }
}
