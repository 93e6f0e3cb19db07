//! Candidate rosters and their hyperparameter grids

use super::adaboost::AdaBoostRegressor;
use super::catboost::{CatBoostConfig, CatBoostRegressor};
use super::decision_tree::DecisionTreeRegressor;
use super::gradient_boosting::GradientBoostingRegressor;
use super::linear_models::LinearRegression;
use super::models::Fittable;
use super::params::{ParamGrid, Params};
use super::random_forest::RandomForestRegressor;
use super::regressor::Regressor;
use super::xgboost::{XGBoostConfig, XGBoostRegressor};
use crate::error::Result;
use std::collections::BTreeSet;

/// Ordered `(identifier, model)` pairs
///
/// Iteration follows insertion order. Inserting an existing identifier
/// replaces its model and keeps its position.
#[derive(Debug, Clone)]
pub struct Roster<M> {
    entries: Vec<(String, M)>,
}

impl<M> Default for Roster<M> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<M> Roster<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, model: impl Into<M>) -> Self {
        self.insert(name, model.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, model: M) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = model,
            None => self.entries.push((name, model)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&M> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut M> {
        self.entries.iter_mut().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    /// Take a model out of the roster
    pub fn remove(&mut self, name: &str) -> Option<M> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &M)> {
        self.entries.iter().map(|(n, m)| (n.as_str(), m))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut M)> {
        self.entries.iter_mut().map(|(n, m)| (n.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Grid per candidate identifier
#[derive(Debug, Clone, Default)]
pub struct GridSet {
    grids: Vec<(String, ParamGrid)>,
}

impl GridSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, grid: ParamGrid) -> Self {
        self.insert(name, grid);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, grid: ParamGrid) {
        let name = name.into();
        match self.grids.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = grid,
            None => self.grids.push((name, grid)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamGrid> {
        self.grids.iter().find(|(n, _)| n == name).map(|(_, g)| g)
    }

    pub fn names(&self) -> Vec<&str> {
        self.grids.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

/// Identifiers present on one side only: `(missing_grids, orphan_grids)`
pub(crate) fn key_mismatch<M>(roster: &Roster<M>, grids: &GridSet) -> (Vec<String>, Vec<String>) {
    let models: BTreeSet<&str> = roster.names().into_iter().collect();
    let gridded: BTreeSet<&str> = grids.names().into_iter().collect();
    (
        models.difference(&gridded).map(|s| s.to_string()).collect(),
        gridded.difference(&models).map(|s| s.to_string()).collect(),
    )
}

pub const RANDOM_FOREST: &str = "Random Forest";
pub const DECISION_TREE: &str = "Decision Tree";
pub const GRADIENT_BOOSTING: &str = "Gradient Boosting";
pub const LINEAR_REGRESSION: &str = "Linear Regression";
pub const XGB_REGRESSOR: &str = "XGBRegressor";
pub const CATBOOST_REGRESSOR: &str = "CatBoosting Regressor";
pub const ADABOOST_REGRESSOR: &str = "AdaBoost Regressor";

const N_ESTIMATORS: [i64; 6] = [8, 16, 32, 64, 128, 256];

/// The seven model families with library defaults
///
/// `random_state` reseeds every stochastic model when given.
pub fn default_roster(random_state: Option<u64>) -> Result<Roster<Regressor>> {
    let mut roster: Roster<Regressor> = Roster::new()
        .with(RANDOM_FOREST, RandomForestRegressor::default())
        .with(DECISION_TREE, DecisionTreeRegressor::new())
        .with(GRADIENT_BOOSTING, GradientBoostingRegressor::default())
        .with(LINEAR_REGRESSION, LinearRegression::new())
        .with(XGB_REGRESSOR, XGBoostRegressor::new(XGBoostConfig::default()))
        .with(CATBOOST_REGRESSOR, CatBoostRegressor::new(CatBoostConfig::default()))
        .with(ADABOOST_REGRESSOR, AdaBoostRegressor::default());

    if let Some(seed) = random_state {
        let params = Params::new().with("random_state", seed as i64);
        for (_, model) in roster.iter_mut() {
            if model.get_params().get("random_state").is_some() {
                model.set_params(&params)?;
            }
        }
    }
    Ok(roster)
}

/// Curated grids for [`default_roster`]
pub fn default_grids() -> GridSet {
    GridSet::new()
        .with(RANDOM_FOREST, ParamGrid::new().ints("n_estimators", &N_ESTIMATORS))
        .with(
            DECISION_TREE,
            ParamGrid::new().categorical(
                "criterion",
                &["squared_error", "friedman_mse", "absolute_error", "poisson"],
            ),
        )
        .with(
            GRADIENT_BOOSTING,
            ParamGrid::new()
                .ints("n_estimators", &N_ESTIMATORS)
                .floats(
                    "learning_rate",
                    &[0.0001, 0.001, 0.01, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0],
                )
                .floats("subsample", &[0.6, 0.7, 0.75, 0.8, 0.85, 0.9]),
        )
        .with(LINEAR_REGRESSION, ParamGrid::new())
        .with(
            XGB_REGRESSOR,
            ParamGrid::new()
                .floats("learning_rate", &[0.1, 0.01, 0.05, 0.001])
                .ints("n_estimators", &N_ESTIMATORS),
        )
        .with(
            CATBOOST_REGRESSOR,
            ParamGrid::new()
                .ints("depth", &[6, 8, 10])
                .floats("learning_rate", &[0.01, 0.05, 0.1])
                .ints("iterations", &[30, 50, 100]),
        )
        .with(
            ADABOOST_REGRESSOR,
            ParamGrid::new()
                .floats("learning_rate", &[0.1, 0.01, 0.5, 0.001])
                .ints("n_estimators", &N_ESTIMATORS),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::params::ParamValue;

    #[test]
    fn test_default_roster_matches_grids() {
        let roster = default_roster(None).unwrap();
        let grids = default_grids();
        assert_eq!(roster.names(), grids.names());
        assert_eq!(roster.len(), 7);
        let (missing, orphan) = key_mismatch(&roster, &grids);
        assert!(missing.is_empty() && orphan.is_empty());
    }

    #[test]
    fn test_default_grids_apply_to_their_models() {
        let roster = default_roster(None).unwrap();
        let grids = default_grids();
        for (name, model) in roster.iter() {
            let grid = grids.get(name).unwrap();
            grid.validate().unwrap();
            for combo in grid.combinations() {
                model.clone().set_params(&combo).unwrap();
            }
        }
        assert_eq!(grids.get(GRADIENT_BOOSTING).unwrap().n_combinations(), 6 * 13 * 6);
        assert!(grids.get(LINEAR_REGRESSION).unwrap().is_empty());
    }

    #[test]
    fn test_random_state_reaches_stochastic_models() {
        let roster = default_roster(Some(7)).unwrap();
        let forest = roster.get(RANDOM_FOREST).unwrap();
        assert_eq!(forest.get_params().get("random_state"), Some(&ParamValue::Int(7)));
        let linear = roster.get(LINEAR_REGRESSION).unwrap();
        assert!(linear.get_params().get("random_state").is_none());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut roster: Roster<LinearRegression> = Roster::new()
            .with("a", LinearRegression::new())
            .with("b", LinearRegression::new());
        roster.insert("a", LinearRegression::new().with_fit_intercept(false));
        assert_eq!(roster.names(), vec!["a", "b"]);
        assert!(!roster.get("a").unwrap().fit_intercept);

        let grids = GridSet::new().with("a", ParamGrid::new()).with("c", ParamGrid::new());
        let (missing, orphan) = key_mismatch(&roster, &grids);
        assert_eq!(missing, vec!["b".to_string()]);
        assert_eq!(orphan, vec!["c".to_string()]);
    }
}
