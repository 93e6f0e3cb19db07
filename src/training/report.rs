//! Per-candidate evaluation results

use super::params::Params;
use crate::error::{Result, SelectorError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wall-clock timings of one candidate, in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    pub grid_search: f64,
    pub final_fit: f64,
    pub prediction: f64,
    pub total: f64,
}

/// Result of evaluating one candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEvaluation {
    pub name: String,
    /// Held-out R²
    pub r2: f64,
    pub best_params: Params,
    /// Mean fold R² of the best combination
    pub cv_mean: f64,
    pub cv_std: f64,
    pub n_combinations: usize,
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub timings: Timings,
}

/// Ordered evaluation report, one entry per candidate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationReport {
    entries: Vec<ModelEvaluation>,
    /// Wall-clock time of the whole evaluation, in seconds
    pub total_time: f64,
}

impl EvaluationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, evaluation: ModelEvaluation) {
        self.entries.push(evaluation);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelEvaluation> {
        self.entries.iter()
    }

    /// Test R² of a candidate
    pub fn score(&self, name: &str) -> Option<f64> {
        self.get(name).map(|e| e.r2)
    }

    pub fn get(&self, name: &str) -> Option<&ModelEvaluation> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Candidate identifiers in evaluation order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Entry with the highest score
    ///
    /// Ties go to the earliest entry. NaN scores are never chosen; an empty or
    /// all-NaN report is an error.
    pub fn best(&self) -> Result<&ModelEvaluation> {
        let mut best: Option<&ModelEvaluation> = None;
        for entry in self.entries.iter().filter(|e| !e.r2.is_nan()) {
            match best {
                Some(current) if entry.r2 <= current.r2 => {}
                _ => best = Some(entry),
            }
        }
        best.ok_or_else(|| {
            SelectorError::ValidationError(if self.entries.is_empty() {
                "evaluation report is empty".to_string()
            } else {
                "no candidate produced a finite score".to_string()
            })
        })
    }
}

impl<'a> IntoIterator for &'a EvaluationReport {
    type Item = &'a ModelEvaluation;
    type IntoIter = std::slice::Iter<'a, ModelEvaluation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Renders as `{'name': score, ...}`
impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{}': {}", entry.name, entry.r2)?;
        }
        write!(f, "}}")
    }
}
