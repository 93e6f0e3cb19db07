//! AdaBoost.R2 regressor
//!
//! Each round draws a weighted bootstrap sample, fits a shallow regression
//! tree to it and scores that tree on every training row. Rows with large
//! relative error gain weight for the next round. Predictions are the
//! weighted median of the tree predictions.

use super::decision_tree::DecisionTreeRegressor;
use super::models::{check_fit_input, check_predict_input, Fittable};
use super::params::{expect_f64_in, expect_seed, expect_usize, invalid, unknown, Params};
use crate::error::{Result, SelectorError};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How relative errors are shaped before weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdaBoostLoss {
    Linear,
    Square,
    Exponential,
}

impl AdaBoostLoss {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdaBoostLoss::Linear => "linear",
            AdaBoostLoss::Square => "square",
            AdaBoostLoss::Exponential => "exponential",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "linear" => Some(AdaBoostLoss::Linear),
            "square" => Some(AdaBoostLoss::Square),
            "exponential" => Some(AdaBoostLoss::Exponential),
            _ => None,
        }
    }

    fn apply(&self, relative_error: f64) -> f64 {
        match self {
            AdaBoostLoss::Linear => relative_error,
            AdaBoostLoss::Square => relative_error * relative_error,
            AdaBoostLoss::Exponential => 1.0 - (-relative_error).exp(),
        }
    }
}

/// AdaBoost.R2 over depth-limited regression trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoostRegressor {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub loss: AdaBoostLoss,
    /// Depth of each weak learner
    pub max_depth: usize,
    pub random_state: Option<u64>,
    estimators: Vec<DecisionTreeRegressor>,
    estimator_weights: Vec<f64>,
    estimator_errors: Vec<f64>,
    n_features: usize,
}

impl Default for AdaBoostRegressor {
    fn default() -> Self {
        Self::new(50, 1.0)
    }
}

impl AdaBoostRegressor {
    pub fn new(n_estimators: usize, learning_rate: f64) -> Self {
        Self {
            n_estimators,
            learning_rate,
            loss: AdaBoostLoss::Linear,
            max_depth: 3,
            random_state: None,
            estimators: Vec::new(),
            estimator_weights: Vec::new(),
            estimator_errors: Vec::new(),
            n_features: 0,
        }
    }

    pub fn with_loss(mut self, loss: AdaBoostLoss) -> Self {
        self.loss = loss;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Weighted error of each kept round
    pub fn estimator_errors(&self) -> &[f64] {
        &self.estimator_errors
    }

    /// Number of kept weak learners
    pub fn n_fitted(&self) -> usize {
        self.estimators.len()
    }

    /// Draw `n` row indices with probability proportional to `weights`
    fn weighted_bootstrap(weights: &[f64], rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        let mut cdf = Vec::with_capacity(weights.len());
        let mut acc = 0.0;
        for &w in weights {
            acc += w;
            cdf.push(acc);
        }
        (0..weights.len())
            .map(|_| {
                let u = rng.gen::<f64>() * acc;
                cdf.partition_point(|&c| c <= u).min(weights.len() - 1)
            })
            .collect()
    }
}

impl Fittable for AdaBoostRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let n_samples = x.nrows();

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.random_state.unwrap_or(42));
        let mut weights = vec![1.0 / n_samples as f64; n_samples];

        let mut estimators = Vec::with_capacity(self.n_estimators);
        let mut estimator_weights = Vec::with_capacity(self.n_estimators);
        let mut estimator_errors = Vec::with_capacity(self.n_estimators);

        for round in 0..self.n_estimators {
            let rows = Self::weighted_bootstrap(&weights, &mut rng);

            let mut tree = DecisionTreeRegressor::new()
                .with_max_depth(self.max_depth)
                .with_random_state(rng.gen());
            tree.fit_rows(x, y, &rows)?;

            let predictions = tree.predict(x)?;
            let mut errors: Vec<f64> = predictions
                .iter()
                .zip(y.iter())
                .map(|(p, t)| (p - t).abs())
                .collect();
            let error_max = errors.iter().cloned().fold(0.0, f64::max);
            if error_max > 0.0 {
                for e in &mut errors {
                    *e = self.loss.apply(*e / error_max);
                }
            }

            let estimator_error: f64 = weights.iter().zip(&errors).map(|(w, e)| w * e).sum();

            if estimator_error <= 0.0 {
                // Perfect fit; nothing left to boost
                estimators.push(tree);
                estimator_weights.push(1.0);
                estimator_errors.push(0.0);
                break;
            }

            if estimator_error >= 0.5 {
                // Too weak; keep it only when it would be the sole learner
                if estimators.is_empty() {
                    estimators.push(tree);
                    estimator_weights.push(1.0);
                    estimator_errors.push(estimator_error);
                }
                break;
            }

            let beta = estimator_error / (1.0 - estimator_error);
            estimators.push(tree);
            estimator_weights.push(self.learning_rate * (1.0 / beta).ln());
            estimator_errors.push(estimator_error);

            if round + 1 < self.n_estimators {
                for (w, e) in weights.iter_mut().zip(&errors) {
                    *w *= beta.powf((1.0 - e) * self.learning_rate);
                }
                let total: f64 = weights.iter().sum();
                if !(total > 0.0 && total.is_finite()) {
                    break;
                }
                for w in &mut weights {
                    *w /= total;
                }
            }
        }

        if estimators.is_empty() {
            return Err(SelectorError::TrainingError(
                "AdaBoost produced no estimators".to_string(),
            ));
        }

        self.estimators = estimators;
        self.estimator_weights = estimator_weights;
        self.estimator_errors = estimator_errors;
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.estimators.is_empty() {
            return Err(SelectorError::ModelNotFitted);
        }
        check_predict_input(x, self.n_features)?;

        let all: Vec<Array1<f64>> = self
            .estimators
            .iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<_>>()?;
        let total_weight: f64 = self.estimator_weights.iter().sum();

        Ok((0..x.nrows())
            .map(|i| {
                let mut pairs: Vec<(f64, f64)> = all
                    .iter()
                    .zip(&self.estimator_weights)
                    .map(|(preds, &w)| (preds[i], w))
                    .collect();
                pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

                let half = 0.5 * total_weight;
                let mut cumulative = 0.0;
                for &(value, weight) in &pairs {
                    cumulative += weight;
                    if cumulative >= half {
                        return value;
                    }
                }
                pairs[pairs.len() - 1].0
            })
            .collect())
    }

    fn get_params(&self) -> Params {
        Params::new()
            .with("n_estimators", self.n_estimators as i64)
            .with("learning_rate", self.learning_rate)
            .with("loss", self.loss.as_str())
            .with("max_depth", self.max_depth as i64)
            .with("random_state", self.random_state.map(|s| s as i64))
    }

    fn set_params(&mut self, params: &Params) -> Result<()> {
        let mut next = self.clone();
        for (name, value) in params.iter() {
            match name.as_str() {
                "n_estimators" => next.n_estimators = expect_usize(name, value)?,
                "learning_rate" => next.learning_rate = expect_f64_in(name, value, 0.0, f64::INFINITY)?,
                "loss" => {
                    next.loss = value
                        .as_str()
                        .and_then(AdaBoostLoss::parse)
                        .ok_or_else(|| invalid(name, value, "expected 'linear', 'square' or 'exponential'"))?;
                }
                "max_depth" => next.max_depth = expect_usize(name, value)?,
                "random_state" => next.random_state = expect_seed(name, value)?,
                _ => return Err(unknown(self.model_type(), name, value)),
            }
        }
        *self = next;
        Ok(())
    }

    fn model_type(&self) -> &'static str {
        "AdaBoostRegressor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::r2_score;

    fn make_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((80, 2), |(i, j)| ((i * (3 + j)) % 29) as f64);
        let y = x.column(0).mapv(|v| 2.0 * v) + x.column(1);
        (x, y)
    }

    #[test]
    fn test_adaboost_regressor() {
        let (x, y) = make_data();
        let mut model = AdaBoostRegressor::new(30, 0.5).with_random_state(3);
        model.fit(&x, &y).unwrap();
        let preds = model.predict(&x).unwrap();
        assert!(r2_score(&y, &preds).unwrap() > 0.6);
        assert!(model.estimator_errors().iter().all(|&e| e < 0.5));
    }

    #[test]
    fn test_weighted_bootstrap_respects_weights() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let rows = AdaBoostRegressor::weighted_bootstrap(&[0.0, 1.0, 0.0], &mut rng);
        assert_eq!(rows, vec![1, 1, 1]);
    }

    #[test]
    fn test_perfect_learner_stops_early() {
        let x = Array2::from_shape_fn((8, 1), |(i, _)| i as f64);
        let y = Array1::from_elem(8, 3.0);
        let mut model = AdaBoostRegressor::default();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.n_fitted(), 1);
        assert!(model.predict(&x).unwrap().iter().all(|&p| p == 3.0));
    }

    #[test]
    fn test_losses() {
        for loss in ["linear", "square", "exponential"] {
            let (x, y) = make_data();
            let mut model = AdaBoostRegressor::default();
            model
                .set_params(&Params::new().with("loss", loss).with("n_estimators", 8i64))
                .unwrap();
            model.fit(&x, &y).unwrap();
            assert_eq!(model.predict(&x).unwrap().len(), 80);
        }
        let mut model = AdaBoostRegressor::default();
        assert!(model.set_params(&Params::new().with("loss", "huber")).is_err());
    }
}
