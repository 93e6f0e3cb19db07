//! CatBoost-style gradient boosting on symmetric (oblivious) trees
//!
//! Every level of a symmetric tree applies one `(feature, border)` test to
//! all of its nodes, so a tree of depth `d` is a list of `d` tests and a
//! table of `2^d` leaf values. Features are quantized once per fit into at
//! most `border_count` borders; split search then works on per-leaf
//! gradient histograms.

use super::models::{check_fit_input, check_predict_input, Fittable};
use super::params::{expect_f64, expect_f64_in, expect_seed, expect_usize, invalid, unknown, Params};
use crate::error::{Result, SelectorError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Largest supported tree depth
const MAX_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatBoostConfig {
    /// Boosting rounds
    pub iterations: usize,
    pub learning_rate: f64,
    /// Depth of every symmetric tree
    pub depth: usize,
    /// L2 regularization of leaf values
    pub l2_leaf_reg: f64,
    /// Maximum number of borders per feature
    pub border_count: usize,
    /// Fraction of rows drawn for each tree
    pub subsample: f64,
    pub random_state: Option<u64>,
}

impl Default for CatBoostConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            learning_rate: 0.03,
            depth: 6,
            l2_leaf_reg: 3.0,
            border_count: 254,
            subsample: 1.0,
            random_state: None,
        }
    }
}

/// Symmetric (oblivious) tree: each level uses the same split feature + threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SymmetricTree {
    /// (feature, threshold) per level
    splits: Vec<(usize, f64)>,
    /// 2^depth leaf values
    leaf_values: Vec<f64>,
}

impl SymmetricTree {
    fn predict(&self, sample: ArrayView1<f64>) -> f64 {
        let mut idx = 0usize;
        for &(feature, threshold) in &self.splits {
            idx = idx * 2 + usize::from(sample[feature] > threshold);
        }
        self.leaf_values[idx]
    }
}

/// Per-feature borders and the bin of every training value
#[derive(Debug)]
struct Quantized {
    borders: Vec<Vec<f64>>,
    /// bins[f][i]: number of borders of feature f strictly below x[i, f]
    bins: Vec<Vec<u16>>,
}

impl Quantized {
    fn new(x: &Array2<f64>, border_count: usize) -> Self {
        let (borders, bins) = (0..x.ncols())
            .map(|f| {
                let column = x.column(f);
                let borders = feature_borders(column, border_count);
                let bins: Vec<u16> = column
                    .iter()
                    .map(|&v| borders.partition_point(|&b| b < v) as u16)
                    .collect();
                (borders, bins)
            })
            .unzip();
        Self { borders, bins }
    }
}

/// Midpoints between distinct values, thinned to quantiles when there are too many
fn feature_borders(column: ArrayView1<f64>, border_count: usize) -> Vec<f64> {
    let mut values: Vec<f64> = column.iter().copied().filter(|v| v.is_finite()).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    values.dedup();

    let midpoints: Vec<f64> = values.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
    if midpoints.len() <= border_count {
        return midpoints;
    }

    let mut borders: Vec<f64> = (1..=border_count)
        .map(|k| {
            let pos = k * midpoints.len() / (border_count + 1);
            midpoints[pos.min(midpoints.len() - 1)]
        })
        .collect();
    borders.dedup();
    borders
}

fn leaf_score(g: f64, h: f64, reg_lambda: f64) -> f64 {
    g * g / (h + reg_lambda)
}

fn build_symmetric_tree(
    quantized: &Quantized,
    gradients: &[f64],
    indices: &[usize],
    depth: usize,
    reg_lambda: f64,
) -> SymmetricTree {
    let n_features = quantized.borders.len();
    let mut splits = Vec::with_capacity(depth);

    // Leaf index of every sampled row
    let mut leaf_of: Vec<usize> = vec![0; indices.len()];
    let mut n_leaves = 1usize;

    for _level in 0..depth {
        // Histograms are kept only for leaves that hold rows
        let mut compact = vec![usize::MAX; n_leaves];
        let mut n_active = 0usize;
        let slot_of: Vec<usize> = leaf_of
            .iter()
            .map(|&leaf| {
                if compact[leaf] == usize::MAX {
                    compact[leaf] = n_active;
                    n_active += 1;
                }
                compact[leaf]
            })
            .collect();

        let candidates: Vec<Option<(usize, usize, f64)>> = (0..n_features)
            .into_par_iter()
            .map(|feat| {
                let n_borders = quantized.borders[feat].len();
                if n_borders == 0 {
                    return None;
                }
                let n_bins = n_borders + 1;
                let bins = &quantized.bins[feat];

                // hist[slot * n_bins + bin] = (gradient sum, count)
                let mut hist = vec![(0.0f64, 0.0f64); n_active * n_bins];
                for (pos, &i) in indices.iter().enumerate() {
                    let cell = &mut hist[slot_of[pos] * n_bins + bins[i] as usize];
                    cell.0 += gradients[i];
                    cell.1 += 1.0;
                }

                // gain[k]: total gain of sending bins <= k left in every leaf
                let mut gain = vec![0.0f64; n_borders];
                for slot in 0..n_active {
                    let row = &hist[slot * n_bins..(slot + 1) * n_bins];
                    let (g_total, h_total) = row
                        .iter()
                        .fold((0.0, 0.0), |(g, h), &(dg, dh)| (g + dg, h + dh));
                    if h_total == 0.0 {
                        continue;
                    }
                    let parent = leaf_score(g_total, h_total, reg_lambda);
                    let (mut g_left, mut h_left) = (0.0, 0.0);
                    for (k, acc) in gain.iter_mut().enumerate() {
                        g_left += row[k].0;
                        h_left += row[k].1;
                        *acc += leaf_score(g_left, h_left, reg_lambda)
                            + leaf_score(g_total - g_left, h_total - h_left, reg_lambda)
                            - parent;
                    }
                }

                gain.iter()
                    .enumerate()
                    .fold(None, |best: Option<(usize, f64)>, (k, &g)| match best {
                        Some((_, bg)) if bg >= g => best,
                        _ => Some((k, g)),
                    })
                    .filter(|&(_, g)| g > 1e-12)
                    .map(|(k, g)| (feat, k, g))
            })
            .collect();

        let best = candidates.into_iter().flatten().fold(None, |best: Option<(usize, usize, f64)>, c| {
            match best {
                Some(b) if b.2 >= c.2 => Some(b),
                _ => Some(c),
            }
        });

        let Some((feat, border_idx, _)) = best else {
            break;
        };

        let bins = &quantized.bins[feat];
        for (pos, &i) in indices.iter().enumerate() {
            leaf_of[pos] = leaf_of[pos] * 2 + usize::from(bins[i] as usize > border_idx);
        }
        n_leaves *= 2;
        splits.push((feat, quantized.borders[feat][border_idx]));
    }

    let mut sums = vec![(0.0f64, 0.0f64); n_leaves];
    for (pos, &i) in indices.iter().enumerate() {
        sums[leaf_of[pos]].0 += gradients[i];
        sums[leaf_of[pos]].1 += 1.0;
    }
    let leaf_values = sums
        .iter()
        .map(|&(g, h)| if h == 0.0 { 0.0 } else { -g / (h + reg_lambda) })
        .collect();

    SymmetricTree { splits, leaf_values }
}

/// Gradient boosting on symmetric trees (RMSE loss)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatBoostRegressor {
    pub config: CatBoostConfig,
    trees: Vec<SymmetricTree>,
    base_prediction: f64,
    n_features: usize,
}

impl CatBoostRegressor {
    pub fn new(config: CatBoostConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Number of fitted trees
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        self.base_prediction
            + self.config.learning_rate * self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }
}

impl Fittable for CatBoostRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let n = x.nrows();
        if self.config.border_count >= u16::MAX as usize {
            return Err(SelectorError::ValidationError(format!(
                "border_count {} exceeds the supported maximum",
                self.config.border_count
            )));
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state.unwrap_or(42));
        let base_prediction = y.mean().unwrap_or(0.0);
        let mut predictions = Array1::from_elem(n, base_prediction);
        let quantized = Quantized::new(x, self.config.border_count);

        let mut trees = Vec::with_capacity(self.config.iterations);
        for _ in 0..self.config.iterations {
            let gradients: Vec<f64> = predictions.iter().zip(y.iter()).map(|(&p, &yi)| p - yi).collect();

            let indices: Vec<usize> = if self.config.subsample < 1.0 {
                let k = ((n as f64 * self.config.subsample).ceil() as usize).max(1);
                let mut sub: Vec<usize> = (0..n).collect();
                sub.shuffle(&mut rng);
                sub.truncate(k);
                sub
            } else {
                (0..n).collect()
            };

            let tree = build_symmetric_tree(
                &quantized,
                &gradients,
                &indices,
                self.config.depth,
                self.config.l2_leaf_reg,
            );

            for (i, row) in x.outer_iter().enumerate() {
                predictions[i] += self.config.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        self.trees = trees;
        self.base_prediction = base_prediction;
        self.n_features = x.ncols();
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
            .with("iterations", c.iterations as i64)
            .with("learning_rate", c.learning_rate)
            .with("depth", c.depth as i64)
            .with("l2_leaf_reg", c.l2_leaf_reg)
            .with("border_count", c.border_count as i64)
            .with("subsample", c.subsample)
            .with("random_state", c.random_state.map(|s| s as i64))
    }

    fn set_params(&mut self, params: &Params) -> Result<()> {
        let mut next = self.config.clone();
        for (name, value) in params.iter() {
            match name.as_str() {
                "iterations" => next.iterations = expect_usize(name, value)?,
                "learning_rate" => next.learning_rate = expect_f64_in(name, value, 0.0, f64::INFINITY)?,
                "depth" => {
                    let depth = expect_usize(name, value)?;
                    if depth > MAX_DEPTH {
                        return Err(invalid(name, value, &format!("depth must be at most {}", MAX_DEPTH)));
                    }
                    next.depth = depth;
                }
                "l2_leaf_reg" => {
                    let reg = expect_f64(name, value)?;
                    if reg < 0.0 {
                        return Err(invalid(name, value, "must be non-negative"));
                    }
                    next.l2_leaf_reg = reg;
                }
                "border_count" => {
                    let count = expect_usize(name, value)?;
                    if count >= u16::MAX as usize {
                        return Err(invalid(name, value, "must be below 65535"));
                    }
                    next.border_count = count;
                }
                "subsample" => next.subsample = expect_f64_in(name, value, 0.0, 1.0)?,
                "random_state" => next.random_state = expect_seed(name, value)?,
                _ => return Err(unknown(self.model_type(), name, value)),
            }
        }
        self.config = next;
        Ok(())
    }

    fn model_type(&self) -> &'static str {
        "CatBoostRegressor"
    }
}
