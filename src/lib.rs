//! model-selector - Grid-searched regression model selection
//!
//! Given a prepared numeric train/test split, this crate tunes a fixed roster
//! of regressors by cross-validated grid search, scores each on the test
//! split with R², and persists the best fitted model.
//!
//! # Modules
//!
//! - [`training`] - Regressors, grid search, the search-and-score engine and
//!   the trainer
//! - [`persistence`] - Binary artifact save/load
//! - [`dataset`] - CSV loading and feature/target splitting
//! - [`config`] - Trainer configuration
//! - [`logging`] - File log sink
//! - [`error`] - Error types with call-site locations
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core modules
pub mod training;
pub mod persistence;

// Ambient
pub mod config;
pub mod dataset;
pub mod logging;

// Services
pub mod cli;

pub use error::{ErrorKind, Result, ResultExt, SelectorError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::TrainerConfig;
    pub use crate::dataset::{split_features_target, Dataset};
    pub use crate::error::{ErrorKind, Result, ResultExt, SelectorError};
    pub use crate::logging::{LogConfig, LogHandle};
    pub use crate::persistence::{load_object, save_object};
    pub use crate::training::{
        default_grids, default_roster, r2_score, EngineConfig, EvaluationReport, Fittable,
        GridSet, ModelTrainer, ParamGrid, ParamValue, Params, Regressor, Roster, SavedModel,
        SearchEngine, TrainingOutcome,
    };
}
