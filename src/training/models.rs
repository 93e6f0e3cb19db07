//! Model trait and regression metrics

use super::params::Params;
use crate::error::{Result, SelectorError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Contract every candidate regressor satisfies
///
/// `fit` replaces any previously fitted state, so refitting an instance is
/// equivalent to fitting a fresh one with the same hyperparameters.
pub trait Fittable: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Make predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Current hyperparameters
    fn get_params(&self) -> Params;

    /// Apply hyperparameters; unknown names and mistyped values are rejected
    fn set_params(&mut self, params: &Params) -> Result<()>;

    /// Short type name used in logs and artifact metadata
    fn model_type(&self) -> &'static str;
}

/// Check the inputs of a `fit` call
pub(crate) fn check_fit_input(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(SelectorError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(SelectorError::TrainingError(
            "cannot fit on an empty dataset".to_string(),
        ));
    }
    Ok(())
}

/// Check the feature count of a `predict` call
pub(crate) fn check_predict_input(x: &Array2<f64>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(SelectorError::ShapeError {
            expected: format!("{} features", n_features),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(())
}

/// Coefficient of determination
///
/// With a constant target the score is 1.0 for an exact prediction and 0.0
/// otherwise.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(SelectorError::ShapeError {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    if y_true.is_empty() {
        return Err(SelectorError::ValidationError(
            "R2 score needs at least one sample".to_string(),
        ));
    }

    let n = y_true.len() as f64;
    let y_mean = y_true.sum() / n;
    let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    if ss_tot > 0.0 {
        Ok(1.0 - ss_res / ss_tot)
    } else if ss_res == 0.0 {
        Ok(1.0)
    } else {
        Ok(0.0)
    }
}

/// Held-out regression metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Coefficient of determination
    pub r2: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// Number of scored samples
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Compute regression metrics
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        let r2 = r2_score(y_true, y_pred)?;

        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let mse: f64 = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae: f64 = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        Ok(Self {
            r2,
            mse,
            rmse: mse.sqrt(),
            mae,
            n_samples: y_true.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regression_metrics() {
        let y_true = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let y_pred = array![1.1, 2.0, 2.9, 4.1, 5.0];

        let metrics = RegressionMetrics::compute(&y_true, &y_pred).unwrap();

        assert!(metrics.r2 > 0.9);
        assert!((metrics.mse - 0.006).abs() < 1e-9);
        assert!((metrics.rmse - 0.006f64.sqrt()).abs() < 1e-9);
        assert!((metrics.mae - 0.06).abs() < 1e-9);
        assert_eq!(metrics.n_samples, 5);
    }

    #[test]
    fn test_r2_perfect_and_mean() {
        let y = array![3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(r2_score(&y, &y).unwrap(), 1.0);

        let mean = y.sum() / y.len() as f64;
        let flat = Array1::from_elem(5, mean);
        assert!(r2_score(&y, &flat).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_r2_constant_target() {
        let y = array![2.0, 2.0, 2.0];
        assert_eq!(r2_score(&y, &array![2.0, 2.0, 2.0]).unwrap(), 1.0);
        assert_eq!(r2_score(&y, &array![2.0, 2.5, 2.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_r2_can_be_negative() {
        let y = array![1.0, 2.0, 3.0];
        let bad = array![3.0, 2.0, 1.0];
        assert!(r2_score(&y, &bad).unwrap() < 0.0);
    }

    #[test]
    fn test_r2_length_mismatch() {
        let err = r2_score(&array![1.0, 2.0], &array![1.0]).unwrap_err();
        assert!(matches!(err, SelectorError::ShapeError { .. }));
    }
}
