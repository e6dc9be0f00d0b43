/// A simple statistics module with some utility functions over time series samples.
use statrs::statistics::Statistics;

/// Arithmetic mean, or zero for an empty series.
pub fn mean(numbers: &[f64]) -> f64 {
    if numbers.is_empty() {
        return 0.;
    }
    numbers.mean()
}

pub fn max(numbers: &[f64]) -> Option<f64> {
    (!numbers.is_empty()).then(|| numbers.max())
}

pub fn min(numbers: &[f64]) -> Option<f64> {
    (!numbers.is_empty()).then(|| numbers.min())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn numbers() -> [f64; 10] {
        [9.0, 3.0, 3.0, 4.0, 5.0, 4.9, 8.0, 3.3, 2.0, 0.1]
    }

    #[rstest]
    fn test_mean(numbers: [f64; 10]) {
        assert_relative_eq!(mean(&numbers), 4.23, max_relative = 1e-12);
        assert_eq!(mean(&[]), 0.);
    }

    #[rstest]
    fn test_extremes(numbers: [f64; 10]) {
        assert_eq!(max(&numbers), Some(9.0));
        assert_eq!(min(&numbers), Some(0.1));
        assert_eq!(max(&[]), None);
    }
}
