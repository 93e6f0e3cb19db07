//! Random Forest regressor

use super::decision_tree::{Criterion, DecisionTreeRegressor};
use super::models::{check_fit_input, check_predict_input, Fittable};
use super::params::{
    expect_bool, expect_optional_usize, expect_seed, expect_usize, invalid, unknown, ParamValue,
    Params,
};
use crate::error::{Result, SelectorError};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Strategy for features drawn at each split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// Log2 of n_features
    Log2,
    /// Fraction of n_features
    Fraction(f64),
    /// Fixed number
    Fixed(usize),
    /// All features
    All,
}

impl MaxFeatures {
    fn resolve(&self, n_features: usize) -> usize {
        match *self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().floor() as usize,
            MaxFeatures::Fraction(f) => (n_features as f64 * f).floor() as usize,
            MaxFeatures::Fixed(n) => n.min(n_features),
            MaxFeatures::All => n_features,
        }
        .max(1)
    }

    fn to_param(self) -> ParamValue {
        match self {
            MaxFeatures::Sqrt => ParamValue::from("sqrt"),
            MaxFeatures::Log2 => ParamValue::from("log2"),
            MaxFeatures::Fraction(f) => ParamValue::Float(f),
            MaxFeatures::Fixed(n) => ParamValue::Int(n as i64),
            MaxFeatures::All => ParamValue::Null,
        }
    }

    fn from_param(name: &str, value: &ParamValue) -> Result<Self> {
        match value {
            ParamValue::Null => Ok(MaxFeatures::All),
            ParamValue::String(s) if s == "sqrt" => Ok(MaxFeatures::Sqrt),
            ParamValue::String(s) if s == "log2" => Ok(MaxFeatures::Log2),
            ParamValue::Float(f) if *f > 0.0 && *f <= 1.0 => Ok(MaxFeatures::Fraction(*f)),
            ParamValue::Int(_) => expect_usize(name, value).map(MaxFeatures::Fixed),
            other => Err(invalid(name, other, "expected 'sqrt', 'log2', a count, a fraction or None")),
        }
    }
}

/// Bagged ensemble of regression trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    /// Individual trees
    trees: Vec<DecisionTreeRegressor>,
    /// Number of trees
    pub n_estimators: usize,
    /// Split criterion for every tree
    pub criterion: Criterion,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features drawn at each split
    pub max_features: MaxFeatures,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Random state
    pub random_state: Option<u64>,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
    /// Number of features
    n_features: usize,
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForestRegressor {
    /// Create a new forest
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            criterion: Criterion::SquaredError,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            bootstrap: true,
            random_state: None,
            feature_importances: None,
            n_features: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set max features strategy
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Number of fitted trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    fn compute_feature_importances(&mut self) {
        let mut total_importances = vec![0.0; self.n_features];

        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (acc, &val) in total_importances.iter_mut().zip(imp.iter()) {
                    *acc += val;
                }
            }
        }

        let total: f64 = total_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut total_importances {
                *imp /= total;
            }
        }

        self.feature_importances = Some(Array1::from_vec(total_importances));
    }
}

impl Fittable for RandomForestRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let n_samples = x.nrows();
        let n_features = x.ncols();
        let max_features = self.max_features.resolve(n_features);

        let base_seed = self.random_state.unwrap_or(42);

        // Trees are seeded by index so the forest is identical on any pool size
        let trees: Vec<DecisionTreeRegressor> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let sample_indices: Vec<usize> = if self.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let mut tree = DecisionTreeRegressor::new()
                    .with_criterion(self.criterion)
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_max_features(max_features)
                    .with_random_state(rng.gen());
                tree.max_depth = self.max_depth;

                tree.fit_rows(x, y, &sample_indices).map(|_| tree)
            })
            .collect::<Result<_>>()?;

        self.trees = trees;
        self.n_features = n_features;
        self.compute_feature_importances();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(SelectorError::ModelNotFitted);
        }
        check_predict_input(x, self.n_features)?;

        let all_predictions: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<_>>()?;

        let mut sum = Array1::<f64>::zeros(x.nrows());
        for preds in &all_predictions {
            sum += preds;
        }
        Ok(sum / self.trees.len() as f64)
    }

    fn get_params(&self) -> Params {
        Params::new()
            .with("n_estimators", self.n_estimators as i64)
            .with("criterion", self.criterion.as_str())
            .with("max_depth", self.max_depth.map(|d| d as i64))
            .with("min_samples_split", self.min_samples_split as i64)
            .with("min_samples_leaf", self.min_samples_leaf as i64)
            .with("max_features", self.max_features.to_param())
            .with("bootstrap", self.bootstrap)
            .with("random_state", self.random_state.map(|s| s as i64))
    }

    fn set_params(&mut self, params: &Params) -> Result<()> {
        let mut next = self.clone();
        for (name, value) in params.iter() {
            match name.as_str() {
                "n_estimators" => next.n_estimators = expect_usize(name, value)?,
                "criterion" => {
                    next.criterion = value
                        .as_str()
                        .and_then(Criterion::parse)
                        .ok_or_else(|| invalid(name, value, "unknown criterion"))?;
                }
                "max_depth" => next.max_depth = expect_optional_usize(name, value)?,
                "min_samples_split" => next.min_samples_split = expect_usize(name, value)?,
                "min_samples_leaf" => next.min_samples_leaf = expect_usize(name, value)?,
                "max_features" => next.max_features = MaxFeatures::from_param(name, value)?,
                "bootstrap" => next.bootstrap = expect_bool(name, value)?,
                "random_state" => next.random_state = expect_seed(name, value)?,
                _ => return Err(unknown(self.model_type(), name, value)),
            }
        }
        *self = next;
        Ok(())
    }

    fn model_type(&self) -> &'static str {
        "RandomForestRegressor"
    }
}
