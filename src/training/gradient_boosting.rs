//! Gradient Boosting regressor
//!
//! Least-squares boosting of shallow regression trees: the ensemble starts
//! at the target mean and every stage fits a tree to the current residuals
//! on a row subsample, shrunk by the learning rate.

use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::decision_tree::{Criterion, DecisionTreeRegressor};
use super::models::{check_fit_input, check_predict_input, Fittable};
use super::params::{
    expect_f64_in, expect_optional_usize, expect_seed, expect_usize, invalid, unknown, Params,
};
use crate::error::{Result, SelectorError};

/// Gradient Boosting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Fraction of rows drawn (without replacement) for each tree
    pub subsample: f64,
    /// Split criterion of the stage trees
    pub criterion: Criterion,
    /// Random seed
    pub random_state: Option<u64>,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: Some(3),
            min_samples_split: 2,
            min_samples_leaf: 1,
            subsample: 1.0,
            criterion: Criterion::FriedmanMse,
            random_state: None,
        }
    }
}

/// Gradient Boosting Regressor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    config: GradientBoostingConfig,
    trees: Vec<DecisionTreeRegressor>,
    initial_prediction: f64,
    n_features: usize,
    /// Training loss after each stage
    train_score: Vec<f64>,
}

impl GradientBoostingRegressor {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &GradientBoostingConfig {
        &self.config
    }

    /// Mean squared training loss after each stage, on the rows that stage saw
    pub fn train_score(&self) -> &[f64] {
        &self.train_score
    }

    fn subsample_indices(&self, n: usize, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        if self.config.subsample >= 1.0 {
            return indices;
        }
        let size = ((n as f64 * self.config.subsample) as usize).max(1);
        indices.shuffle(rng);
        indices.truncate(size);
        indices.sort_unstable();
        indices
    }
}

impl Fittable for GradientBoostingRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let n_samples = x.nrows();

        let initial_prediction = y.mean().unwrap_or(0.0);
        let mut predictions = Array1::from_elem(n_samples, initial_prediction);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state.unwrap_or(42));

        let mut trees = Vec::with_capacity(self.config.n_estimators);
        let mut train_score = Vec::with_capacity(self.config.n_estimators);

        for _ in 0..self.config.n_estimators {
            let residuals = y - &predictions;
            let sample_indices = self.subsample_indices(n_samples, &mut rng);

            let mut tree = DecisionTreeRegressor::new()
                .with_criterion(self.config.criterion)
                .with_min_samples_split(self.config.min_samples_split)
                .with_min_samples_leaf(self.config.min_samples_leaf);
            tree.max_depth = self.config.max_depth;
            tree.fit_rows(x, &residuals, &sample_indices)?;

            let update = tree.predict(x)?;
            predictions.scaled_add(self.config.learning_rate, &update);

            let loss = sample_indices
                .iter()
                .map(|&i| (y[i] - predictions[i]).powi(2))
                .sum::<f64>()
                / sample_indices.len() as f64;
            train_score.push(loss);
            trees.push(tree);
        }

        self.trees = trees;
        self.train_score = train_score;
        self.initial_prediction = initial_prediction;
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(SelectorError::ModelNotFitted);
        }
        check_predict_input(x, self.n_features)?;

        let mut predictions = Array1::from_elem(x.nrows(), self.initial_prediction);
        for tree in &self.trees {
            predictions.scaled_add(self.config.learning_rate, &tree.predict(x)?);
        }
        Ok(predictions)
    }

    fn get_params(&self) -> Params {
        let c = &self.config;
        Params::new()
            .with("n_estimators", c.n_estimators as i64)
            .with("learning_rate", c.learning_rate)
            .with("max_depth", c.max_depth.map(|d| d as i64))
            .with("min_samples_split", c.min_samples_split as i64)
            .with("min_samples_leaf", c.min_samples_leaf as i64)
            .with("subsample", c.subsample)
            .with("criterion", c.criterion.as_str())
            .with("random_state", c.random_state.map(|s| s as i64))
    }

    fn set_params(&mut self, params: &Params) -> Result<()> {
        let mut next = self.config.clone();
        for (name, value) in params.iter() {
            match name.as_str() {
                "n_estimators" => next.n_estimators = expect_usize(name, value)?,
                "learning_rate" => next.learning_rate = expect_f64_in(name, value, 0.0, f64::INFINITY)?,
                "max_depth" => next.max_depth = expect_optional_usize(name, value)?,
                "min_samples_split" => next.min_samples_split = expect_usize(name, value)?,
                "min_samples_leaf" => next.min_samples_leaf = expect_usize(name, value)?,
                "subsample" => next.subsample = expect_f64_in(name, value, 0.0, 1.0)?,
                "criterion" => {
                    next.criterion = value
                        .as_str()
                        .and_then(Criterion::parse)
                        .filter(|c| matches!(c, Criterion::SquaredError | Criterion::FriedmanMse))
                        .ok_or_else(|| invalid(name, value, "expected 'friedman_mse' or 'squared_error'"))?;
                }
                "random_state" => next.random_state = expect_seed(name, value)?,
                _ => return Err(unknown(self.model_type(), name, value)),
            }
        }
        self.config = next;
        Ok(())
    }

    fn model_type(&self) -> &'static str {
        "GradientBoostingRegressor"
    }
}
