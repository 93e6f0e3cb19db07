//! CART regression tree

use super::models::{check_fit_input, check_predict_input, Fittable};
use super::params::{
    expect_optional_usize, expect_seed, expect_usize, invalid, unknown, ParamValue, Params,
};
use crate::error::{Result, SelectorError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Two feature values closer than this are treated as equal when placing thresholds
const FEATURE_THRESHOLD: f64 = 1e-7;

/// Child means at or below this make a poisson split invalid
const POISSON_EPSILON: f64 = 1e-12;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64, n_samples: usize },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

impl TreeNode {
    /// Route one row to its leaf
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature_idx] <= *threshold { left } else { right };
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

/// Split quality criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Criterion {
    /// Variance reduction
    SquaredError,
    /// Variance reduction with Friedman's improvement score
    FriedmanMse,
    /// Sum of absolute deviations from the median
    AbsoluteError,
    /// Half poisson deviance; targets must be non-negative
    Poisson,
}

impl Criterion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::SquaredError => "squared_error",
            Criterion::FriedmanMse => "friedman_mse",
            Criterion::AbsoluteError => "absolute_error",
            Criterion::Poisson => "poisson",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "squared_error" => Some(Criterion::SquaredError),
            "friedman_mse" => Some(Criterion::FriedmanMse),
            "absolute_error" => Some(Criterion::AbsoluteError),
            "poisson" => Some(Criterion::Poisson),
            _ => None,
        }
    }
}

/// Regression tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    /// Tree root
    root: Option<TreeNode>,
    /// Split criterion
    pub criterion: Criterion,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (all when unset)
    pub max_features: Option<usize>,
    /// Seed for the per-node feature draw
    pub random_state: Option<u64>,
    /// Number of features seen at fit
    n_features: usize,
    /// Normalized variance reduction per feature
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeRegressor {
    pub fn new() -> Self {
        Self {
            root: None,
            criterion: Criterion::SquaredError,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set the number of features drawn at each split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit on a subset of rows; `rows` may repeat indices (bootstrap samples)
    pub fn fit_rows(&mut self, x: &Array2<f64>, y: &Array1<f64>, rows: &[usize]) -> Result<()> {
        check_fit_input(x, y)?;
        if rows.is_empty() {
            return Err(SelectorError::TrainingError(
                "cannot grow a tree from zero rows".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(SelectorError::InvalidParameter {
                name: "min_samples_split".to_string(),
                value: self.min_samples_split.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        if self.min_samples_leaf == 0 {
            return Err(SelectorError::InvalidParameter {
                name: "min_samples_leaf".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.criterion == Criterion::Poisson {
            if rows.iter().any(|&i| y[i] < 0.0) {
                return Err(SelectorError::TrainingError(
                    "some target values are negative; the poisson criterion needs y >= 0"
                        .to_string(),
                ));
            }
            if rows.iter().map(|&i| y[i]).sum::<f64>() <= 0.0 {
                return Err(SelectorError::TrainingError(
                    "the poisson criterion needs a positive target sum".to_string(),
                ));
            }
        }

        let n_features = x.ncols();
        let mut builder = TreeBuilder {
            x,
            y,
            tree: self,
            rng: ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0)),
            importances: vec![0.0; n_features],
        };
        let root = builder.build(rows.to_vec(), 0);
        let mut importances = builder.importances;

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }

        self.root = Some(root);
        self.n_features = n_features;
        self.feature_importances = Some(Array1::from_vec(importances));
        Ok(())
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        self.root.as_ref().map_or(0, TreeNode::depth)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        self.root.as_ref().map_or(0, TreeNode::n_leaves)
    }

    /// Predict a single row; `None` before fit
    pub fn predict_row(&self, row: ArrayView1<f64>) -> Option<f64> {
        self.root.as_ref().map(|root| root.predict_row(row))
    }
}

impl Fittable for DecisionTreeRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let rows: Vec<usize> = (0..x.nrows()).collect();
        self.fit_rows(x, y, &rows)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(SelectorError::ModelNotFitted)?;
        check_predict_input(x, self.n_features)?;
        Ok(x.outer_iter().map(|row| root.predict_row(row)).collect())
    }

    fn get_params(&self) -> Params {
        Params::new()
            .with("criterion", self.criterion.as_str())
            .with("max_depth", self.max_depth.map(|d| d as i64))
            .with("min_samples_split", self.min_samples_split as i64)
            .with("min_samples_leaf", self.min_samples_leaf as i64)
            .with("max_features", self.max_features.map(|m| m as i64))
            .with("random_state", self.random_state.map(|s| s as i64))
    }

    fn set_params(&mut self, params: &Params) -> Result<()> {
        let mut next = self.clone();
        for (name, value) in params.iter() {
            match name.as_str() {
                "criterion" => {
                    next.criterion = value
                        .as_str()
                        .and_then(Criterion::parse)
                        .ok_or_else(|| invalid(name, value, "unknown criterion"))?;
                }
                "max_depth" => next.max_depth = expect_optional_usize(name, value)?,
                "min_samples_split" => next.min_samples_split = expect_usize(name, value)?,
                "min_samples_leaf" => next.min_samples_leaf = expect_usize(name, value)?,
                "max_features" => next.max_features = expect_optional_usize(name, value)?,
                "random_state" => next.random_state = expect_seed(name, value)?,
                _ => return Err(unknown(self.model_type(), name, value)),
            }
        }
        *self = next;
        Ok(())
    }

    fn model_type(&self) -> &'static str {
        "DecisionTreeRegressor"
    }
}

/// Best split found for one node
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    /// Criterion-specific proxy, larger is better
    score: f64,
    /// Squared-error reduction, used for importances
    sse_decrease: f64,
}

struct TreeBuilder<'a> {
    x: &'a Array2<f64>,
    y: &'a Array1<f64>,
    tree: &'a DecisionTreeRegressor,
    rng: ChaCha8Rng,
    importances: Vec<f64>,
}

impl TreeBuilder<'_> {
    fn build(&mut self, rows: Vec<usize>, depth: usize) -> TreeNode {
        let n_samples = rows.len();
        let ys: Vec<f64> = rows.iter().map(|&i| self.y[i]).collect();
        let value = leaf_value(self.tree.criterion, &ys);

        let should_stop = n_samples < self.tree.min_samples_split
            || n_samples < 2 * self.tree.min_samples_leaf
            || self.tree.max_depth.map_or(false, |d| depth >= d)
            || is_pure(&ys);

        if should_stop {
            return TreeNode::Leaf { value, n_samples };
        }

        let Some(split) = self.best_split(&rows, &ys) else {
            return TreeNode::Leaf { value, n_samples };
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&i| self.x[[i, split.feature_idx]] <= split.threshold);

        self.importances[split.feature_idx] += split.sse_decrease;

        let left = Box::new(self.build(left_rows, depth + 1));
        let right = Box::new(self.build(right_rows, depth + 1));

        TreeNode::Split {
            feature_idx: split.feature_idx,
            threshold: split.threshold,
            left,
            right,
            n_samples,
        }
    }

    fn best_split(&mut self, rows: &[usize], ys: &[f64]) -> Option<SplitCandidate> {
        let n_features = self.x.ncols();
        let mut features: Vec<usize> = (0..n_features).collect();
        let limit = match self.tree.max_features {
            Some(k) if k < n_features => {
                features.shuffle(&mut self.rng);
                k
            }
            _ => n_features,
        };

        let ranks = match self.tree.criterion {
            Criterion::AbsoluteError => Some(RankedTargets::new(ys)),
            _ => None,
        };

        let mut best: Option<SplitCandidate> = None;
        let mut visited = 0;

        for &feature_idx in &features {
            if visited >= limit {
                break;
            }

            let mut order: Vec<usize> = (0..rows.len()).collect();
            order.sort_by(|&a, &b| {
                self.x[[rows[a], feature_idx]]
                    .partial_cmp(&self.x[[rows[b], feature_idx]])
                    .unwrap_or(Ordering::Equal)
            });

            let values: Vec<f64> = order.iter().map(|&p| self.x[[rows[p], feature_idx]]).collect();
            // Constant features do not count against the draw
            if values[values.len() - 1] <= values[0] + FEATURE_THRESHOLD {
                continue;
            }
            visited += 1;

            if let Some(candidate) = self.scan_feature(feature_idx, &order, &values, ys, ranks.as_ref()) {
                if best.map_or(true, |b| candidate.score > b.score) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    /// Evaluate every threshold of one feature with running sums
    fn scan_feature(
        &self,
        feature_idx: usize,
        order: &[usize],
        values: &[f64],
        ys: &[f64],
        ranks: Option<&RankedTargets>,
    ) -> Option<SplitCandidate> {
        let n = order.len();
        let min_leaf = self.tree.min_samples_leaf;
        let total_sum: f64 = ys.iter().sum();
        let total_sq: f64 = ys.iter().map(|v| v * v).sum();
        let parent_sse = total_sq - total_sum * total_sum / n as f64;

        let mut abs_state = ranks.map(|r| AbsoluteScan::new(r, order));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        let mut best: Option<SplitCandidate> = None;

        for p in 1..n {
            let yi = ys[order[p - 1]];
            left_sum += yi;
            left_sq += yi * yi;
            if let Some(state) = abs_state.as_mut() {
                state.move_left(order[p - 1]);
            }

            let n_left = p;
            let n_right = n - p;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }
            if values[p] <= values[p - 1] + FEATURE_THRESHOLD {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let (nl, nr) = (n_left as f64, n_right as f64);

            let score = match self.tree.criterion {
                Criterion::SquaredError => left_sum * left_sum / nl + right_sum * right_sum / nr,
                Criterion::FriedmanMse => {
                    let diff = nr * left_sum - nl * right_sum;
                    diff * diff / (nl * nr)
                }
                Criterion::AbsoluteError => match abs_state.as_ref() {
                    Some(state) => -state.total_deviation(),
                    None => continue,
                },
                Criterion::Poisson => {
                    if left_sum / nl <= POISSON_EPSILON || right_sum / nr <= POISSON_EPSILON {
                        continue;
                    }
                    left_sum * (left_sum / nl).ln() + right_sum * (right_sum / nr).ln()
                }
            };

            if best.map_or(true, |b| score > b.score) {
                let sse_left = left_sq - left_sum * left_sum / nl;
                let sse_right = right_sq - right_sum * right_sum / nr;
                best = Some(SplitCandidate {
                    feature_idx,
                    threshold: (values[p - 1] + values[p]) / 2.0,
                    score,
                    sse_decrease: (parent_sse - sse_left - sse_right).max(0.0),
                });
            }
        }

        best
    }
}

fn is_pure(ys: &[f64]) -> bool {
    match ys.first() {
        None => true,
        Some(&first) => ys.iter().all(|&v| (v - first).abs() < 1e-12),
    }
}

fn leaf_value(criterion: Criterion, ys: &[f64]) -> f64 {
    if ys.is_empty() {
        return 0.0;
    }
    match criterion {
        Criterion::AbsoluteError => median(ys),
        _ => ys.iter().sum::<f64>() / ys.len() as f64,
    }
}

pub(crate) fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Node targets sorted once, with each position's rank
struct RankedTargets {
    sorted: Vec<f64>,
    rank_of: Vec<usize>,
}

impl RankedTargets {
    fn new(ys: &[f64]) -> Self {
        let mut by_value: Vec<usize> = (0..ys.len()).collect();
        by_value.sort_by(|&a, &b| ys[a].partial_cmp(&ys[b]).unwrap_or(Ordering::Equal));
        let mut rank_of = vec![0; ys.len()];
        for (rank, &pos) in by_value.iter().enumerate() {
            rank_of[pos] = rank + 1;
        }
        let sorted = by_value.iter().map(|&p| ys[p]).collect();
        Self { sorted, rank_of }
    }
}

/// Fenwick tree over target ranks holding counts and sums
struct Fenwick {
    count: Vec<i64>,
    sum: Vec<f64>,
    total_count: i64,
    total_sum: f64,
}

impl Fenwick {
    fn new(size: usize) -> Self {
        Self {
            count: vec![0; size + 1],
            sum: vec![0.0; size + 1],
            total_count: 0,
            total_sum: 0.0,
        }
    }

    fn update(&mut self, rank: usize, value: f64, delta: i64) {
        self.total_count += delta;
        self.total_sum += value * delta as f64;
        let mut i = rank;
        while i < self.count.len() {
            self.count[i] += delta;
            self.sum[i] += value * delta as f64;
            i += i & i.wrapping_neg();
        }
    }

    /// Rank of the k-th smallest element and the sum of all elements ranked below it
    fn kth(&self, k: i64) -> (usize, f64) {
        let size = self.count.len() - 1;
        let mut step = size.next_power_of_two();
        let mut pos = 0;
        let mut remaining = k;
        let mut below = 0.0;
        while step > 0 {
            let next = pos + step;
            if next <= size && self.count[next] < remaining {
                pos = next;
                remaining -= self.count[next];
                below += self.sum[next];
            }
            step >>= 1;
        }
        (pos + 1, below)
    }

    /// Sum of absolute deviations from the lower median
    fn deviation(&self, sorted: &[f64]) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }
        let k = (self.total_count + 1) / 2;
        let (rank, below) = self.kth(k);
        let m = sorted[rank - 1];
        let lower_sum = below + m;
        let upper_sum = self.total_sum - lower_sum;
        m * k as f64 - lower_sum + upper_sum - m * (self.total_count - k) as f64
    }
}

/// Incremental left/right absolute deviation while sweeping a sorted feature
struct AbsoluteScan<'a> {
    ranks: &'a RankedTargets,
    left: Fenwick,
    right: Fenwick,
}

impl<'a> AbsoluteScan<'a> {
    fn new(ranks: &'a RankedTargets, order: &[usize]) -> Self {
        let n = ranks.sorted.len();
        let left = Fenwick::new(n);
        let mut right = Fenwick::new(n);
        for &pos in order {
            let rank = ranks.rank_of[pos];
            right.update(rank, ranks.sorted[rank - 1], 1);
        }
        Self { ranks, left, right }
    }

    fn move_left(&mut self, pos: usize) {
        let rank = self.ranks.rank_of[pos];
        let value = self.ranks.sorted[rank - 1];
        self.right.update(rank, value, -1);
        self.left.update(rank, value, 1);
    }

    fn total_deviation(&self) -> f64 {
        self.left.deviation(&self.ranks.sorted) + self.right.deviation(&self.ranks.sorted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn step_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = array![1.0, 1.0, 1.0, 5.0, 5.0, 5.0];
        (x, y)
    }

    #[test]
    fn test_regressor_simple() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];

        let mut tree = DecisionTreeRegressor::new();
        tree.fit(&x, &y).unwrap();

        let predictions = tree.predict(&x).unwrap();
        let mse: f64 = predictions
            .iter()
            .zip(y.iter())
            .map(|(p, a)| (p - a).powi(2))
            .sum::<f64>()
            / y.len() as f64;

        assert!(mse < 1e-12, "MSE too high: {}", mse);
    }

    #[test]
    fn test_every_criterion_finds_the_step() {
        let (x, y) = step_data();
        for name in ["squared_error", "friedman_mse", "absolute_error", "poisson"] {
            let mut tree = DecisionTreeRegressor::new();
            tree.set_params(&Params::new().with("criterion", name)).unwrap();
            tree.fit(&x, &y).unwrap();

            let predictions = tree.predict(&x).unwrap();
            for (p, t) in predictions.iter().zip(y.iter()) {
                assert!((p - t).abs() < 1e-9, "{}: predicted {} for {}", name, p, t);
            }
            assert_eq!(tree.get_n_leaves(), 2, "{}", name);
        }
    }

    #[test]
    fn test_absolute_error_uses_median_leaves() {
        let x = array![[0.0], [0.0], [0.0]];
        let y = array![1.0, 2.0, 100.0];
        let mut tree = DecisionTreeRegressor::new().with_criterion(Criterion::AbsoluteError);
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&array![[0.0]]).unwrap()[0], 2.0);
    }

    #[test]
    fn test_fenwick_deviation_matches_brute_force() {
        let ys = [5.0, 1.0, 4.0, 2.0, 8.0, 3.0];
        let ranks = RankedTargets::new(&ys);
        let order: Vec<usize> = (0..ys.len()).collect();
        let mut scan = AbsoluteScan::new(&ranks, &order);

        for split in 1..ys.len() {
            scan.move_left(split - 1);
            let brute = |part: &[f64]| {
                let m = median(part);
                part.iter().map(|v| (v - m).abs()).sum::<f64>()
            };
            let expected = brute(&ys[..split]) + brute(&ys[split..]);
            assert!((scan.total_deviation() - expected).abs() < 1e-9, "split {}", split);
        }
    }

    #[test]
    fn test_poisson_rejects_negative_targets() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1.0, -2.0, 3.0];
        let mut tree = DecisionTreeRegressor::new().with_criterion(Criterion::Poisson);
        let err = tree.fit(&x, &y).unwrap_err();
        assert!(matches!(err, SelectorError::TrainingError(_)));
    }

    #[test]
    fn test_max_depth() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![0.0, 1.0, 2.0, 3.0];

        let mut tree = DecisionTreeRegressor::new().with_max_depth(1);
        tree.fit(&x, &y).unwrap();

        assert!(tree.get_depth() <= 2);
        assert_eq!(tree.get_n_leaves(), 2);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTreeRegressor::new();
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert!((importances[0] - 1.0).abs() < 1e-12);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_predict_before_fit_and_wrong_width() {
        let tree = DecisionTreeRegressor::new();
        assert!(matches!(
            tree.predict(&array![[1.0]]).unwrap_err(),
            SelectorError::ModelNotFitted
        ));

        let (x, y) = step_data();
        let mut tree = DecisionTreeRegressor::new();
        tree.fit(&x, &y).unwrap();
        assert!(matches!(
            tree.predict(&array![[1.0, 2.0]]).unwrap_err(),
            SelectorError::ShapeError { .. }
        ));
    }

    #[test]
    fn test_set_params_is_all_or_nothing() {
        let mut tree = DecisionTreeRegressor::new();
        let bad = Params::new()
            .with("criterion", "poisson")
            .with("n_estimators", 10i64);
        assert!(tree.set_params(&bad).is_err());
        assert_eq!(tree.criterion, Criterion::SquaredError);

        assert!(tree
            .set_params(&Params::new().with("criterion", "gini"))
            .is_err());
        tree.set_params(&Params::new().with("max_depth", ParamValue::Null)).unwrap();
        assert_eq!(tree.max_depth, None);
        assert_eq!(
            tree.get_params().get("criterion"),
            Some(&ParamValue::String("squared_error".into()))
        );
    }

    #[test]
    fn test_refit_replaces_state() {
        let (x, y) = step_data();
        let mut tree = DecisionTreeRegressor::new();
        tree.fit(&x, &y).unwrap();
        let y2 = y.mapv(|v| v * 2.0);
        tree.fit(&x, &y2).unwrap();
        assert_eq!(tree.predict(&array![[6.0]]).unwrap()[0], 10.0);
    }
}
