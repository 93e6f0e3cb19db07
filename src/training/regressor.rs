//! Serializable union of the built-in regressors

use super::adaboost::AdaBoostRegressor;
use super::catboost::CatBoostRegressor;
use super::decision_tree::DecisionTreeRegressor;
use super::gradient_boosting::GradientBoostingRegressor;
use super::linear_models::LinearRegression;
use super::models::Fittable;
use super::params::Params;
use super::random_forest::RandomForestRegressor;
use super::xgboost::XGBoostRegressor;
use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Enum to hold every candidate model family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Regressor {
    RandomForest(RandomForestRegressor),
    DecisionTree(DecisionTreeRegressor),
    GradientBoosting(GradientBoostingRegressor),
    LinearRegression(LinearRegression),
    XGBoost(XGBoostRegressor),
    CatBoost(CatBoostRegressor),
    AdaBoost(AdaBoostRegressor),
}

macro_rules! dispatch {
    ($self:expr, $model:ident => $body:expr) => {
        match $self {
            Regressor::RandomForest($model) => $body,
            Regressor::DecisionTree($model) => $body,
            Regressor::GradientBoosting($model) => $body,
            Regressor::LinearRegression($model) => $body,
            Regressor::XGBoost($model) => $body,
            Regressor::CatBoost($model) => $body,
            Regressor::AdaBoost($model) => $body,
        }
    };
}

impl Fittable for Regressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        dispatch!(self, m => m.fit(x, y))
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        dispatch!(self, m => m.predict(x))
    }

    fn get_params(&self) -> Params {
        dispatch!(self, m => m.get_params())
    }

    fn set_params(&mut self, params: &Params) -> Result<()> {
        dispatch!(self, m => m.set_params(params))
    }

    fn model_type(&self) -> &'static str {
        dispatch!(self, m => m.model_type())
    }
}

impl From<RandomForestRegressor> for Regressor {
    fn from(m: RandomForestRegressor) -> Self {
        Regressor::RandomForest(m)
    }
}

impl From<DecisionTreeRegressor> for Regressor {
    fn from(m: DecisionTreeRegressor) -> Self {
        Regressor::DecisionTree(m)
    }
}

impl From<GradientBoostingRegressor> for Regressor {
    fn from(m: GradientBoostingRegressor) -> Self {
        Regressor::GradientBoosting(m)
    }
}

impl From<LinearRegression> for Regressor {
    fn from(m: LinearRegression) -> Self {
        Regressor::LinearRegression(m)
    }
}

impl From<XGBoostRegressor> for Regressor {
    fn from(m: XGBoostRegressor) -> Self {
        Regressor::XGBoost(m)
    }
}

impl From<CatBoostRegressor> for Regressor {
    fn from(m: CatBoostRegressor) -> Self {
        Regressor::CatBoost(m)
    }
}

impl From<AdaBoostRegressor> for Regressor {
    fn from(m: AdaBoostRegressor) -> Self {
        Regressor::AdaBoost(m)
    }
}
