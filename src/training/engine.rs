//! Search-and-score engine
//!
//! For each candidate in roster order the engine runs a cross-validated grid
//! search on the training split, refits the roster's own model instance with
//! the winning hyperparameters on the whole training split, then scores it on
//! the test split. The fitted models stay in the roster.

use super::cross_validation::KFold;
use super::grid_search::GridSearchCV;
use super::models::{Fittable, RegressionMetrics};
use super::report::{EvaluationReport, ModelEvaluation, Timings};
use super::roster::{key_mismatch, GridSet, Roster};
use crate::error::{Result, ResultExt, SelectorError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of cross-validation folds
    pub cv_folds: usize,
    /// Shuffle rows before splitting into folds
    pub shuffle: bool,
    /// Seed for the fold shuffle
    pub random_state: Option<u64>,
    /// Run grid search fits on the rayon pool
    pub parallel: bool,
    /// Echo progress to stdout
    pub verbose: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cv_folds: 3,
            shuffle: false,
            random_state: None,
            parallel: true,
            verbose: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    config: EngineConfig,
}

impl SearchEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn grid_search(&self) -> GridSearchCV {
        let mut cv = KFold::new(self.config.cv_folds).with_shuffle(self.config.shuffle);
        if let Some(seed) = self.config.random_state {
            cv = cv.with_random_state(seed);
        }
        GridSearchCV::new(cv).with_parallel(self.config.parallel)
    }

    /// Tune, refit and score every candidate
    ///
    /// Inputs are validated before the first fit. A combination whose fold
    /// fit fails is scored NaN by the grid search; any other failure aborts
    /// the whole evaluation and no partial report is returned.
    pub fn evaluate<M: Fittable + Clone>(
        &self,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_test: &Array2<f64>,
        y_test: &Array1<f64>,
        roster: &mut Roster<M>,
        grids: &GridSet,
    ) -> Result<EvaluationReport> {
        validate_inputs(x_train, y_train, x_test, y_test).located("engine: input validation")?;
        validate_keys(roster, grids).located("engine: roster validation")?;

        let total_start = Instant::now();
        let search = self.grid_search();
        let mut report = EvaluationReport::new();

        for (name, model) in roster.iter_mut() {
            let candidate_start = Instant::now();
            self.echo(format_args!("Evaluating MODEL NAME: {}", name));
            info!("Starting evaluation for model: {}", name);

            let grid = grids
                .get(name)
                .ok_or_else(|| SelectorError::ConfigError(format!("no grid for '{}'", name)))
                .located("engine: grid lookup")?;

            let gs_start = Instant::now();
            let searched = search
                .fit(&*model, grid, x_train, y_train)
                .located(&format!("engine: grid search for {}", name))?;
            let gs_time = gs_start.elapsed().as_secs_f64();
            self.echo(format_args!("Best Params for {}: {}", name, searched.best_params));
            self.echo(format_args!("GridSearchCV completed in {:.2} seconds", gs_time));
            info!(
                "GridSearchCV for {} completed in {:.2} seconds, best params {}",
                name, gs_time, searched.best_params
            );

            let fit_start = Instant::now();
            model
                .set_params(&searched.best_params)
                .located(&format!("engine: applying best params to {}", name))?;
            model
                .fit(x_train, y_train)
                .located(&format!("engine: final fit of {}", name))?;
            let fit_time = fit_start.elapsed().as_secs_f64();
            self.echo(format_args!("Model {} trained in {:.2} seconds", name, fit_time));
            info!("Final training for {} completed in {:.2} seconds", name, fit_time);

            let predict_start = Instant::now();
            let predictions = model
                .predict(x_test)
                .located(&format!("engine: predicting with {}", name))?;
            let predict_time = predict_start.elapsed().as_secs_f64();
            let metrics = RegressionMetrics::compute(y_test, &predictions)
                .located(&format!("engine: scoring {}", name))?;
            let total_time = candidate_start.elapsed().as_secs_f64();

            self.echo(format_args!("Prediction completed in {:.2} seconds", predict_time));
            self.echo(format_args!("Total time for {}: {:.2} seconds", name, total_time));
            info!("Prediction for {} completed in {:.2} seconds", name, predict_time);
            info!("Total iteration time for {}: {:.2} seconds", name, total_time);

            report.push(ModelEvaluation {
                name: name.to_string(),
                r2: metrics.r2,
                n_combinations: searched.n_combinations(),
                best_params: searched.best_params,
                cv_mean: searched.best_score,
                cv_std: searched.best_std,
                mse: metrics.mse,
                rmse: metrics.rmse,
                mae: metrics.mae,
                timings: Timings {
                    grid_search: gs_time,
                    final_fit: fit_time,
                    prediction: predict_time,
                    total: total_time,
                },
            });
        }

        report.total_time = total_start.elapsed().as_secs_f64();
        self.echo(format_args!("Total evaluation time: {:.2} seconds", report.total_time));
        info!("Total model evaluation time: {:.2} seconds", report.total_time);
        Ok(report)
    }

    fn echo(&self, message: std::fmt::Arguments<'_>) {
        if self.config.verbose {
            println!("{}", message);
        }
    }
}

fn validate_inputs(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<()> {
    if x_train.nrows() != y_train.len() {
        return Err(SelectorError::ShapeError {
            expected: format!("{} training targets", x_train.nrows()),
            actual: format!("{} training targets", y_train.len()),
        });
    }
    if x_test.nrows() != y_test.len() {
        return Err(SelectorError::ShapeError {
            expected: format!("{} test targets", x_test.nrows()),
            actual: format!("{} test targets", y_test.len()),
        });
    }
    if x_train.ncols() != x_test.ncols() {
        return Err(SelectorError::ShapeError {
            expected: format!("{} test features", x_train.ncols()),
            actual: format!("{} test features", x_test.ncols()),
        });
    }
    if x_test.nrows() == 0 {
        return Err(SelectorError::ShapeError {
            expected: "at least one test row".to_string(),
            actual: "0 rows".to_string(),
        });
    }
    Ok(())
}

fn validate_keys<M>(roster: &Roster<M>, grids: &GridSet) -> Result<()> {
    if roster.is_empty() {
        return Err(SelectorError::ConfigError("candidate roster is empty".to_string()));
    }
    let (missing, orphan) = key_mismatch(roster, grids);
    if !missing.is_empty() || !orphan.is_empty() {
        return Err(SelectorError::ConfigError(format!(
            "roster and grid keys differ: no grid for {:?}, no model for {:?}",
            missing, orphan
        )));
    }
    Ok(())
}
