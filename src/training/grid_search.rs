//! Exhaustive hyperparameter search scored by K-fold R²

use super::cross_validation::{CVResults, KFold};
use super::models::{r2_score, Fittable};
use super::params::{ParamGrid, Params};
use crate::error::Result;
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Scores of one hyperparameter combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateScore {
    pub params: Params,
    pub cv: CVResults,
}

/// Outcome of a grid search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSearchResult {
    pub best_params: Params,
    /// Mean fold R² of the best combination
    pub best_score: f64,
    /// Standard deviation of the best combination's fold scores
    pub best_std: f64,
    pub best_index: usize,
    /// Every combination in generation order
    pub candidates: Vec<CandidateScore>,
}

impl GridSearchResult {
    pub fn n_combinations(&self) -> usize {
        self.candidates.len()
    }
}

/// Grid search with cross-validation
///
/// Each combination is applied to a clone of the estimator, fit on the
/// training part of every fold and scored on the held-out part. The
/// estimator passed to [`GridSearchCV::fit`] is never modified. A combination
/// whose fit fails on any fold scores NaN; the search fails only when every
/// combination does.
#[derive(Debug, Clone)]
pub struct GridSearchCV {
    cv: KFold,
    parallel: bool,
}

impl Default for GridSearchCV {
    fn default() -> Self {
        Self::new(KFold::default())
    }
}

impl GridSearchCV {
    pub fn new(cv: KFold) -> Self {
        Self { cv, parallel: true }
    }

    /// Run the (combination, fold) fits on the rayon pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn cv(&self) -> &KFold {
        &self.cv
    }

    pub fn fit<M: Fittable + Clone>(
        &self,
        estimator: &M,
        grid: &ParamGrid,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<GridSearchResult> {
        grid.validate()?;
        let combinations = grid.combinations();

        // Reject bad names and values before the first fit
        let configured: Vec<M> = combinations
            .iter()
            .map(|params| {
                let mut model = estimator.clone();
                model.set_params(params)?;
                Ok(model)
            })
            .collect::<Result<_>>()?;

        let folds: Vec<(Array2<f64>, Array1<f64>, Array2<f64>, Array1<f64>)> = self
            .cv
            .split(x.nrows())?
            .iter()
            .map(|split| split.take(x, y))
            .collect();
        let n_folds = folds.len();

        let tasks: Vec<(usize, usize)> = (0..configured.len())
            .flat_map(|c| (0..n_folds).map(move |f| (c, f)))
            .collect();

        let score_task = |&(c, f): &(usize, usize)| -> Result<f64> {
            let (x_fit, y_fit, x_val, y_val) = &folds[f];
            let mut model = configured[c].clone();
            model.fit(x_fit, y_fit)?;
            let predictions = model.predict(x_val)?;
            r2_score(y_val, &predictions)
        };

        // Collected in task order either way
        let outcomes: Vec<Result<f64>> = if self.parallel {
            tasks.par_iter().map(score_task).collect()
        } else {
            tasks.iter().map(score_task).collect()
        };

        // A failed fold fit scores its combination as NaN
        let mut first_failure = None;
        let mut failed = vec![false; configured.len()];
        let scores: Vec<f64> = tasks
            .iter()
            .zip(outcomes)
            .map(|(&(c, f), outcome)| match outcome {
                Ok(score) => score,
                Err(e) => {
                    let e = e.located(format!(
                        "grid search: {} with {} on fold {}",
                        estimator.model_type(),
                        combinations[c],
                        f
                    ));
                    warn!("Fit failed, scoring combination as NaN: {}", e);
                    failed[c] = true;
                    if first_failure.is_none() {
                        first_failure = Some(e);
                    }
                    f64::NAN
                }
            })
            .collect();

        if failed.iter().all(|&f| f) {
            if let Some(e) = first_failure {
                return Err(e);
            }
        }

        let candidates: Vec<CandidateScore> = combinations
            .into_iter()
            .zip(scores.chunks(n_folds))
            .map(|(params, fold_scores)| CandidateScore {
                params,
                cv: CVResults::from_scores(fold_scores.to_vec()),
            })
            .collect();

        let best_index = best_candidate(&candidates);
        let best = &candidates[best_index];
        debug!(
            model = estimator.model_type(),
            combinations = candidates.len(),
            best_score = best.cv.mean_score,
            "grid search finished"
        );

        Ok(GridSearchResult {
            best_params: best.params.clone(),
            best_score: best.cv.mean_score,
            best_std: best.cv.std_score,
            best_index,
            candidates,
        })
    }
}

/// Index of the highest mean score; the earliest wins ties and NaN never wins over a number
fn best_candidate(candidates: &[CandidateScore]) -> usize {
    let mut best = 0;
    for (i, candidate) in candidates.iter().enumerate().skip(1) {
        let score = candidate.cv.mean_score;
        let current = candidates[best].cv.mean_score;
        if score > current || (current.is_nan() && !score.is_nan()) {
            best = i;
        }
    }
    best
}
