//! Model training and selection
//!
//! - Regressors: random forest, decision tree, gradient boosting, linear
//!   regression, XGBoost-style and CatBoost-style boosting, AdaBoost
//! - Hyperparameters and grids, K-fold cross-validation, grid search
//! - The search-and-score engine and the trainer that selects and persists
//!   the best model

mod models;
pub mod adaboost;
pub mod catboost;
pub mod cross_validation;
pub mod decision_tree;
pub mod engine;
pub mod gradient_boosting;
pub mod grid_search;
pub mod linear_models;
pub mod params;
pub mod random_forest;
pub mod regressor;
pub mod report;
pub mod roster;
pub mod trainer;
pub mod xgboost;

pub use adaboost::{AdaBoostLoss, AdaBoostRegressor};
pub use catboost::{CatBoostConfig, CatBoostRegressor};
pub use cross_validation::{CVResults, CVSplit, KFold};
pub use decision_tree::{Criterion, DecisionTreeRegressor, TreeNode};
pub use engine::{EngineConfig, SearchEngine};
pub use gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
pub use grid_search::{CandidateScore, GridSearchCV, GridSearchResult};
pub use linear_models::LinearRegression;
pub use models::{r2_score, Fittable, RegressionMetrics};
pub use params::{ParamGrid, ParamValue, Params};
pub use random_forest::{MaxFeatures, RandomForestRegressor};
pub use regressor::Regressor;
pub use report::{EvaluationReport, ModelEvaluation, Timings};
pub use roster::{default_grids, default_roster, GridSet, Roster};
pub use trainer::{ModelMetadata, ModelTrainer, SavedModel, TrainingOutcome};
pub use xgboost::{XGBoostConfig, XGBoostRegressor};
