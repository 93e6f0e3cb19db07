//! XGBoost-style gradient boosting with second-order approximation
//!
//! Key differences from standard gradient boosting:
//! - Uses both gradient (first derivative) and hessian (second derivative) of loss
//! - Regularized leaf weights: w* = -G / (H + lambda)
//! - Gain-based split scoring: Gain = 0.5 * [GL²/(HL+λ) + GR²/(HR+λ) - (GL+GR)²/(HL+HR+λ)] - γ
//! - Built-in L1 (alpha) and L2 (lambda) regularization
//! - Minimum child weight constraint

use super::models::{check_fit_input, check_predict_input, Fittable};
use super::params::{expect_f64, expect_f64_in, expect_seed, expect_usize, invalid, unknown, Params};
use crate::error::{Result, SelectorError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// XGBoost configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XGBoostConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// L1 regularization on leaf weights
    pub reg_alpha: f64,
    /// Minimum loss reduction to make a split (gamma)
    pub gamma: f64,
    pub subsample: f64,
    pub colsample_bytree: f64,
    pub random_state: Option<u64>,
}

impl Default for XGBoostConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            gamma: 0.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            random_state: None,
        }
    }
}

/// A single node in a boosted tree
#[derive(Debug, Clone, Serialize, Deserialize)]
enum XGBNode {
    Leaf { weight: f64 },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<XGBNode>,
        right: Box<XGBNode>,
    },
}

impl XGBNode {
    fn predict(&self, sample: ArrayView1<f64>) -> f64 {
        match self {
            XGBNode::Leaf { weight } => *weight,
            XGBNode::Split { feature, threshold, left, right } => {
                if sample[*feature] <= *threshold {
                    left.predict(sample)
                } else {
                    right.predict(sample)
                }
            }
        }
    }
}

/// Per-round inputs shared by every node of one tree
struct TreeContext<'a> {
    x: &'a Array2<f64>,
    grad: &'a Array1<f64>,
    hess: &'a Array1<f64>,
    feature_indices: &'a [usize],
    config: &'a XGBoostConfig,
}

/// Build a tree using exact greedy split finding
fn build_xgb_tree(ctx: &TreeContext<'_>, indices: &[usize], depth: usize) -> XGBNode {
    let n = indices.len();
    let config = ctx.config;

    let g_sum: f64 = indices.iter().map(|&i| ctx.grad[i]).sum();
    let h_sum: f64 = indices.iter().map(|&i| ctx.hess[i]).sum();

    let leaf_weight = compute_leaf_weight(g_sum, h_sum, config.reg_lambda, config.reg_alpha);

    if depth >= config.max_depth || n < 2 || h_sum < config.min_child_weight {
        return XGBNode::Leaf { weight: leaf_weight };
    }

    // Features are scanned in parallel, then reduced in feature order so ties
    // resolve the same way on every run
    let candidates: Vec<Option<(usize, f64, f64)>> = ctx
        .feature_indices
        .par_iter()
        .map(|&f| find_best_split_for_feature(ctx, indices, f))
        .collect();

    let best_split = candidates.into_iter().flatten().fold(None, |best: Option<(usize, f64, f64)>, c| {
        match best {
            Some(b) if b.2 >= c.2 => Some(b),
            _ => Some(c),
        }
    });

    match best_split {
        Some((feature, threshold, gain)) if gain > config.gamma => {
            let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| ctx.x[[i, feature]] <= threshold);

            if left_idx.is_empty() || right_idx.is_empty() {
                return XGBNode::Leaf { weight: leaf_weight };
            }

            XGBNode::Split {
                feature,
                threshold,
                left: Box::new(build_xgb_tree(ctx, &left_idx, depth + 1)),
                right: Box::new(build_xgb_tree(ctx, &right_idx, depth + 1)),
            }
        }
        _ => XGBNode::Leaf { weight: leaf_weight },
    }
}

/// Optimal leaf weight with L1 (alpha) and L2 (lambda) regularization
fn compute_leaf_weight(g_sum: f64, h_sum: f64, lambda: f64, alpha: f64) -> f64 {
    let g_adj = if g_sum > alpha {
        g_sum - alpha
    } else if g_sum < -alpha {
        g_sum + alpha
    } else {
        return 0.0;
    };
    -g_adj / (h_sum + lambda)
}

/// Best `(feature, threshold, gain)` for one feature
fn find_best_split_for_feature(
    ctx: &TreeContext<'_>,
    indices: &[usize],
    feature: usize,
) -> Option<(usize, f64, f64)> {
    let x = ctx.x;
    let mut sorted_indices: Vec<usize> = indices.to_vec();
    sorted_indices.sort_by(|&a, &b| {
        x[[a, feature]].partial_cmp(&x[[b, feature]]).unwrap_or(Ordering::Equal)
    });

    let g_total: f64 = sorted_indices.iter().map(|&i| ctx.grad[i]).sum();
    let h_total: f64 = sorted_indices.iter().map(|&i| ctx.hess[i]).sum();
    let lambda = ctx.config.reg_lambda;
    let min_child_weight = ctx.config.min_child_weight;

    let mut g_left = 0.0;
    let mut h_left = 0.0;
    let mut best: Option<(f64, f64)> = None;

    for pos in 0..sorted_indices.len() - 1 {
        let idx = sorted_indices[pos];
        let next_idx = sorted_indices[pos + 1];
        g_left += ctx.grad[idx];
        h_left += ctx.hess[idx];

        if (x[[idx, feature]] - x[[next_idx, feature]]).abs() < 1e-12 {
            continue;
        }

        let g_right = g_total - g_left;
        let h_right = h_total - h_left;

        if h_left < min_child_weight || h_right < min_child_weight {
            continue;
        }

        let gain = 0.5
            * ((g_left * g_left) / (h_left + lambda) + (g_right * g_right) / (h_right + lambda)
                - (g_total * g_total) / (h_total + lambda));

        if best.map_or(true, |(g, _)| gain > g) {
            let threshold = (x[[idx, feature]] + x[[next_idx, feature]]) / 2.0;
            best = Some((gain, threshold));
        }
    }

    best.map(|(gain, threshold)| (feature, threshold, gain))
}

fn subsample(rng: &mut Xoshiro256PlusPlus, n: usize, ratio: f64) -> Vec<usize> {
    if ratio >= 1.0 {
        return (0..n).collect();
    }
    let k = (((n as f64) * ratio).ceil() as usize).max(1);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(k);
    indices.sort_unstable();
    indices
}

/// XGBoost Regressor (squared error loss)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XGBoostRegressor {
    config: XGBoostConfig,
    trees: Vec<XGBNode>,
    base_score: f64,
    n_features: usize,
}

impl XGBoostRegressor {
    pub fn new(config: XGBoostConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &XGBoostConfig {
        &self.config
    }

    /// Split-count feature importances
    pub fn feature_importances(&self) -> Option<Array1<f64>> {
        if self.trees.is_empty() {
            return None;
        }
        let mut counts = vec![0.0f64; self.n_features];
        for tree in &self.trees {
            count_splits(tree, &mut counts);
        }
        let total: f64 = counts.iter().sum();
        if total > 0.0 {
            for c in counts.iter_mut() {
                *c /= total;
            }
        }
        Some(Array1::from_vec(counts))
    }

    fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        self.base_score
            + self.config.learning_rate * self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }
}

fn count_splits(node: &XGBNode, counts: &mut [f64]) {
    if let XGBNode::Split { feature, left, right, .. } = node {
        if let Some(c) = counts.get_mut(*feature) {
            *c += 1.0;
        }
        count_splits(left, counts);
        count_splits(right, counts);
    }
}

impl Fittable for XGBoostRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let n_samples = x.nrows();
        let n_features = x.ncols();

        let base_score = y.mean().unwrap_or(0.0);
        let mut preds = Array1::from_elem(n_samples, base_score);
        let hess = Array1::from_elem(n_samples, 1.0);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state.unwrap_or(42));
        let mut trees = Vec::with_capacity(self.config.n_estimators);

        for _ in 0..self.config.n_estimators {
            // Squared error: grad = pred - y, hess = 1
            let grad: Array1<f64> = &preds - y;

            let row_indices = subsample(&mut rng, n_samples, self.config.subsample);
            let col_indices = subsample(&mut rng, n_features, self.config.colsample_bytree);

            let ctx = TreeContext {
                x,
                grad: &grad,
                hess: &hess,
                feature_indices: &col_indices,
                config: &self.config,
            };
            let tree = build_xgb_tree(&ctx, &row_indices, 0);

            for (i, row) in x.outer_iter().enumerate() {
                preds[i] += self.config.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        if preds.iter().any(|p| !p.is_finite()) {
            return Err(SelectorError::ConvergenceError {
                iterations: self.config.n_estimators,
            });
        }

        self.trees = trees;
        self.base_score = base_score;
        self.n_features = n_features;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(SelectorError::ModelNotFitted);
        }
        check_predict_input(x, self.n_features)?;
        Ok(x.outer_iter().map(|row| self.predict_row(row)).collect())
    }

    fn get_params(&self) -> Params {
        let c = &self.config;
        Params::new()
            .with("n_estimators", c.n_estimators as i64)
            .with("learning_rate", c.learning_rate)
            .with("max_depth", c.max_depth as i64)
            .with("min_child_weight", c.min_child_weight)
            .with("reg_lambda", c.reg_lambda)
            .with("reg_alpha", c.reg_alpha)
            .with("gamma", c.gamma)
            .with("subsample", c.subsample)
            .with("colsample_bytree", c.colsample_bytree)
            .with("random_state", c.random_state.map(|s| s as i64))
    }

    fn set_params(&mut self, params: &Params) -> Result<()> {
        let mut next = self.config.clone();
        for (name, value) in params.iter() {
            let non_negative = |v: f64| {
                if v >= 0.0 {
                    Ok(v)
                } else {
                    Err(invalid(name, value, "must be non-negative"))
                }
            };
            match name.as_str() {
                "n_estimators" => next.n_estimators = expect_usize(name, value)?,
                "learning_rate" => next.learning_rate = expect_f64_in(name, value, 0.0, f64::INFINITY)?,
                "max_depth" => next.max_depth = expect_usize(name, value)?,
                "min_child_weight" => next.min_child_weight = non_negative(expect_f64(name, value)?)?,
                "reg_lambda" => next.reg_lambda = non_negative(expect_f64(name, value)?)?,
                "reg_alpha" => next.reg_alpha = non_negative(expect_f64(name, value)?)?,
                "gamma" => next.gamma = non_negative(expect_f64(name, value)?)?,
                "subsample" => next.subsample = expect_f64_in(name, value, 0.0, 1.0)?,
                "colsample_bytree" => next.colsample_bytree = expect_f64_in(name, value, 0.0, 1.0)?,
                "random_state" => next.random_state = expect_seed(name, value)?,
                _ => return Err(unknown(self.model_type(), name, value)),
            }
        }
        self.config = next;
        Ok(())
    }

    fn model_type(&self) -> &'static str {
        "XGBoostRegressor"
    }
}
