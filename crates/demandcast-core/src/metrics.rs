//! Accuracy measures for fitted demand.
//!
//! Used by [`crate::forecast::fit_diagnostics`] to summarise how closely the
//! fitted values track the observed history.
//!
//! | Metric | Reads as |
//! |--------|----------|
//! | MAE | Typical miss in units per day |
//! | RMSE | Like MAE but dominated by the worst days |
//! | sMAPE | Relative miss, comparable across products |
//! | Coverage | Share of days inside the uncertainty band |

use crate::error::{ForecastError, Result};

/// Mean absolute error.
///
/// # Formula
/// MAE = (1/n) * Σ|actual_i - fitted_i|
///
/// # Example
/// ```
/// use demandcast_core::metrics::mae;
/// let actual = vec![10.0, 12.0, 9.0];
/// let fitted = vec![11.0, 12.0, 8.0];
/// let error = mae(&actual, &fitted).unwrap();
/// assert!((error - 2.0 / 3.0).abs() < 1e-12);
/// ```
pub fn mae(actual: &[f64], fitted: &[f64]) -> Result<f64> {
    validate_inputs(actual, fitted)?;
    let sum: f64 = actual
        .iter()
        .zip(fitted.iter())
        .map(|(a, f)| (a - f).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Root mean squared error, in the units of the series.
///
/// # Formula
/// RMSE = √[(1/n) * Σ(actual_i - fitted_i)²]
pub fn rmse(actual: &[f64], fitted: &[f64]) -> Result<f64> {
    validate_inputs(actual, fitted)?;
    let sum: f64 = actual
        .iter()
        .zip(fitted.iter())
        .map(|(a, f)| (a - f).powi(2))
        .sum();
    Ok((sum / actual.len() as f64).sqrt())
}

/// Symmetric mean absolute percentage error, 0 to 200.
///
/// Days where both the actual and the fitted value are zero carry no
/// information and are skipped; if every day is skipped the result is 0.
///
/// # Formula
/// sMAPE = (100/n) * Σ 2|actual_i - fitted_i| / (|actual_i| + |fitted_i|)
pub fn smape(actual: &[f64], fitted: &[f64]) -> Result<f64> {
    validate_inputs(actual, fitted)?;
    let (sum, count) = actual
        .iter()
        .zip(fitted.iter())
        .filter(|(a, f)| a.abs() + f.abs() > f64::EPSILON)
        .fold((0.0, 0usize), |(sum, count), (a, f)| {
            (sum + 2.0 * (a - f).abs() / (a.abs() + f.abs()), count + 1)
        });
    if count == 0 {
        return Ok(0.0);
    }
    Ok(sum / count as f64 * 100.0)
}

/// Fraction of observations inside `[lower, upper]`.
///
/// # Formula
/// Coverage = (1/n) * Σ I(lower_i <= actual_i <= upper_i)
pub fn coverage(actual: &[f64], lower: &[f64], upper: &[f64]) -> Result<f64> {
    validate_inputs(actual, lower)?;
    validate_inputs(actual, upper)?;

    let covered = actual
        .iter()
        .zip(lower.iter())
        .zip(upper.iter())
        .filter(|((a, l), u)| *a >= *l && *a <= *u)
        .count();

    Ok(covered as f64 / actual.len() as f64)
}

fn validate_inputs(actual: &[f64], other: &[f64]) -> Result<()> {
    if actual.len() != other.len() {
        return Err(ForecastError::InvalidInput(format!(
            "Actual and fitted arrays must have the same length: {} vs {}",
            actual.len(),
            other.len()
        )));
    }
    if actual.is_empty() {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mae() {
        let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let fitted = vec![1.1, 2.2, 2.9, 4.1, 4.8];
        assert_relative_eq!(mae(&actual, &fitted).unwrap(), 0.14, epsilon = 1e-9);
    }

    #[test]
    fn test_rmse() {
        let actual = vec![1.0, 2.0, 3.0];
        let fitted = vec![1.0, 2.0, 4.0];
        // MSE = 1/3
        assert_relative_eq!(
            rmse(&actual, &fitted).unwrap(),
            (1.0_f64 / 3.0).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_smape() {
        let actual = vec![100.0, 200.0, 300.0];
        let fitted = vec![110.0, 180.0, 330.0];
        let result = smape(&actual, &fitted).unwrap();
        assert!(result > 0.0 && result < 200.0);
    }

    #[test]
    fn test_smape_skips_zero_days() {
        let actual = vec![0.0, 0.0, 10.0];
        let fitted = vec![0.0, 0.0, 10.0];
        assert_relative_eq!(smape(&actual, &fitted).unwrap(), 0.0);

        let all_zero = vec![0.0; 4];
        assert_relative_eq!(smape(&all_zero, &all_zero).unwrap(), 0.0);

        // Zero actual against non-zero fit is the maximum miss
        assert_relative_eq!(smape(&[0.0], &[5.0]).unwrap(), 200.0);
    }

    #[test]
    fn test_coverage_partial() {
        let actual = vec![1.0, 2.0, 3.0, 10.0, 5.0];
        let lower = vec![0.5, 1.5, 2.5, 3.5, 4.5];
        let upper = vec![1.5, 2.5, 3.5, 4.5, 5.5];
        assert_relative_eq!(coverage(&actual, &lower, &upper).unwrap(), 0.8);
    }

    #[test]
    fn test_coverage_bounds_inclusive() {
        let actual = vec![1.0, 2.0];
        assert_relative_eq!(coverage(&actual, &actual, &actual).unwrap(), 1.0);
    }

    #[test]
    fn test_validate_inputs() {
        assert!(mae(&[1.0, 2.0, 3.0], &[1.0, 2.0]).is_err());
        assert!(rmse(&[], &[]).is_err());
        assert!(matches!(
            coverage(&[1.0], &[0.0], &[]),
            Err(ForecastError::InvalidInput(_))
        ));
    }
}
