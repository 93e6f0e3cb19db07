//! Model selector: train the roster, keep the best, persist it

use super::engine::SearchEngine;
use super::models::Fittable;
use super::params::Params;
use super::regressor::Regressor;
use super::report::EvaluationReport;
use super::roster::{default_grids, default_roster, GridSet, Roster};
use crate::config::TrainerConfig;
use crate::dataset::split_features_target;
use crate::error::{Result, ResultExt, SelectorError};
use crate::logging::LogHandle;
use crate::persistence::{load_object, save_object};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, Dispatch};

/// Description of a persisted model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Roster identifier, e.g. `Random Forest`
    pub name: String,
    pub model_type: String,
    /// Held-out R² at selection time
    pub score: f64,
    pub params: Params,
    pub n_features: usize,
    /// Crate version that wrote the artifact
    pub version: String,
    pub trained_at: DateTime<Utc>,
}

/// The artifact written by [`ModelTrainer`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedModel {
    pub metadata: ModelMetadata,
    pub model: Regressor,
}

impl SavedModel {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_object(path)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_object(path, self)
    }

    /// Predict after checking the feature count against the training data
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.metadata.n_features {
            return Err(SelectorError::ShapeError {
                expected: format!("{} features", self.metadata.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        self.model.predict(x)
    }
}

/// Result of a training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub best_model_name: String,
    pub best_score: f64,
    pub report: EvaluationReport,
    pub artifact_path: PathBuf,
}

/// Trains every candidate, selects the best by test R² and saves it
#[derive(Debug, Clone, Default)]
pub struct ModelTrainer {
    config: TrainerConfig,
    candidates: Option<(Roster<Regressor>, GridSet)>,
    dispatch: Option<Dispatch>,
}

impl ModelTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self {
            config,
            candidates: None,
            dispatch: None,
        }
    }

    /// Route this trainer's logs through `handle`
    pub fn with_logger(mut self, handle: &LogHandle) -> Self {
        self.dispatch = Some(handle.dispatch().clone());
        self
    }

    /// Replace the built-in roster and grids
    pub fn with_roster(mut self, roster: Roster<Regressor>, grids: GridSet) -> Self {
        self.candidates = Some((roster, grids));
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train, select and persist; returns the winner's identifier
    ///
    /// The last column of each matrix is the target.
    pub fn train(&self, train: &Array2<f64>, test: &Array2<f64>) -> Result<String> {
        self.train_detailed(train, test)
            .map(|outcome| outcome.best_model_name)
    }

    pub fn train_detailed(&self, train: &Array2<f64>, test: &Array2<f64>) -> Result<TrainingOutcome> {
        match &self.dispatch {
            Some(dispatch) => {
                tracing::dispatcher::with_default(dispatch, || self.run(train, test))
            }
            None => self.run(train, test),
        }
    }

    fn candidates(&self) -> Result<(Roster<Regressor>, GridSet)> {
        match &self.candidates {
            Some((roster, grids)) => Ok((roster.clone(), grids.clone())),
            None => Ok((default_roster(self.config.random_state)?, default_grids())),
        }
    }

    fn run(&self, train: &Array2<f64>, test: &Array2<f64>) -> Result<TrainingOutcome> {
        self.config.validate().located("trainer: configuration")?;

        info!("Splitting training and test input data");
        let (x_train, y_train) =
            split_features_target(train).located("trainer: splitting training data")?;
        let (x_test, y_test) = split_features_target(test).located("trainer: splitting test data")?;

        let (mut roster, grids) = self.candidates().located("trainer: building roster")?;
        let engine = SearchEngine::new(self.config.engine_config());
        let report = engine
            .evaluate(&x_train, &y_train, &x_test, &y_test, &mut roster, &grids)
            .located("trainer: evaluating candidates")?;

        let best = report.best().located("trainer: selecting best model")?;
        let best_model_name = best.name.clone();
        let best_score = best.r2;

        if self.config.verbose {
            println!("{}", report);
            println!(
                "Best Model Found, Model Name: {}, R2 Score: {}",
                best_model_name, best_score
            );
        }
        info!(
            "Best Model Found, Model Name: {}, R2 Score: {}",
            best_model_name, best_score
        );

        if let Some(threshold) = self.config.min_score {
            if best_score < threshold {
                return Err(SelectorError::BelowThreshold {
                    name: best_model_name,
                    score: best_score,
                    threshold,
                }
                .located("trainer: quality threshold"));
            }
        }

        let model = roster
            .remove(&best_model_name)
            .ok_or_else(|| SelectorError::ValidationError(format!("'{}' left the roster", best_model_name)))
            .located("trainer: collecting best model")?;

        let saved = SavedModel {
            metadata: ModelMetadata {
                name: best_model_name.clone(),
                model_type: model.model_type().to_string(),
                score: best_score,
                params: model.get_params(),
                n_features: x_train.ncols(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                trained_at: Utc::now(),
            },
            model,
        };
        saved
            .save(&self.config.artifact_path)
            .located("trainer: saving best model")?;
        info!("Best Model saved as {}", best_model_name);

        Ok(TrainingOutcome {
            best_model_name,
            best_score,
            report,
            artifact_path: self.config.artifact_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::training::decision_tree::DecisionTreeRegressor;
    use crate::training::linear_models::LinearRegression;
    use crate::training::params::ParamGrid;
    use ndarray::{concatenate, Axis};
    use tempfile::tempdir;

    fn table(n: usize, offset: usize) -> Array2<f64> {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (((i + offset) * (j + 2)) % 17) as f64);
        let y = x.column(0).mapv(|v| 1.5 * v) - x.column(1).mapv(|v| 0.25 * v) + 4.0;
        concatenate![Axis(1), x, y.insert_axis(Axis(1))]
    }

    fn trainer(dir: &Path) -> ModelTrainer {
        let roster = Roster::new()
            .with("Decision Tree", DecisionTreeRegressor::new())
            .with("Linear Regression", LinearRegression::new());
        let grids = GridSet::new()
            .with("Decision Tree", ParamGrid::new().ints("max_depth", &[1, 2]))
            .with("Linear Regression", ParamGrid::new());
        ModelTrainer::new(
            TrainerConfig::default()
                .with_artifact_path(dir.join("artifacts").join("model.bin"))
                .with_verbose(false),
        )
        .with_roster(roster, grids)
    }

    #[test]
    fn test_train_selects_and_persists() {
        let dir = tempdir().unwrap();
        let trainer = trainer(dir.path());
        let (train, test) = (table(36, 0), table(12, 40));

        let outcome = trainer.train_detailed(&train, &test).unwrap();
        assert_eq!(outcome.best_model_name, "Linear Regression");
        assert!((outcome.best_score - 1.0).abs() < 1e-9);
        assert_eq!(outcome.report.len(), 2);

        let saved = SavedModel::load(&outcome.artifact_path).unwrap();
        assert_eq!(saved.metadata.name, "Linear Regression");
        assert_eq!(saved.metadata.model_type, "LinearRegression");
        assert_eq!(saved.metadata.n_features, 2);

        let x_test = test.slice(ndarray::s![.., ..2]).to_owned();
        let preds = saved.predict(&x_test).unwrap();
        for (p, t) in preds.iter().zip(test.column(2).iter()) {
            assert!((p - t).abs() < 1e-8);
        }
        assert_eq!(
            saved.predict(&Array2::zeros((1, 3))).unwrap_err().kind(),
            ErrorKind::InputShape
        );
    }

    #[test]
    fn test_threshold_blocks_persistence() {
        let dir = tempdir().unwrap();
        let mut config = trainer(dir.path()).config().clone();
        config.min_score = Some(1.5);
        let trainer = ModelTrainer::new(config.clone()).with_roster(
            Roster::new().with("Linear Regression", LinearRegression::new()),
            GridSet::new().with("Linear Regression", ParamGrid::new()),
        );

        let err = trainer.train(&table(30, 0), &table(10, 3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Selection);
        assert!(!config.artifact_path.exists());
    }

    #[test]
    fn test_single_column_is_shape_error() {
        let dir = tempdir().unwrap();
        let trainer = trainer(dir.path());
        let narrow = Array2::zeros((10, 1));
        let err = trainer.train(&narrow, &table(5, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputShape);
        assert_eq!(err.contexts(), vec!["trainer: splitting training data"]);
    }

    #[test]
    fn test_engine_errors_are_wrapped_twice() {
        let dir = tempdir().unwrap();
        let trainer = trainer(dir.path());
        let err = trainer.train(&table(30, 0), &Array2::zeros((5, 4))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputShape);
        assert_eq!(
            err.contexts(),
            vec!["trainer: evaluating candidates", "engine: input validation"]
        );
    }
}
