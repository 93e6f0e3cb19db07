//! Trainer configuration

use crate::error::{Result, SelectorError};
use crate::training::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a training run
///
/// Missing keys in a JSON file fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Where the selected model is written
    pub artifact_path: PathBuf,

    /// Cross-validation folds per grid search
    pub cv_folds: usize,

    /// Shuffle rows before fold assignment
    pub shuffle: bool,

    /// Seed for fold shuffling and the stochastic models
    pub random_state: Option<u64>,

    /// Run grid search fits in parallel
    pub parallel: bool,

    /// Fail instead of persisting when the best test R² is below this
    pub min_score: Option<f64>,

    /// Echo progress and the report to stdout
    pub verbose: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from("artifacts").join("model.bin"),
            cv_folds: 3,
            shuffle: false,
            random_state: None,
            parallel: true,
            min_score: None,
            verbose: true,
        }
    }
}

impl TrainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json).map_err(|e| {
            SelectorError::ConfigError(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cv_folds < 2 {
            return Err(SelectorError::ConfigError(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if let Some(min) = self.min_score {
            if !min.is_finite() {
                return Err(SelectorError::ConfigError(format!(
                    "min_score must be finite, got {}",
                    min
                )));
            }
        }
        if self.artifact_path.as_os_str().is_empty() {
            return Err(SelectorError::ConfigError(
                "artifact_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_artifact_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_path = path.into();
        self
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = Some(min_score);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Engine settings implied by this configuration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            cv_folds: self.cv_folds,
            shuffle: self.shuffle,
            random_state: self.random_state,
            parallel: self.parallel,
            verbose: self.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = TrainerConfig::default();
        assert_eq!(config.artifact_path, Path::new("artifacts").join("model.bin"));
        assert_eq!(config.cv_folds, 3);
        assert!(config.min_score.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trainer.json");
        std::fs::write(&path, r#"{"cv_folds": 5, "min_score": 0.6}"#).unwrap();

        let config = TrainerConfig::from_file(&path).unwrap();
        assert_eq!(config.cv_folds, 5);
        assert_eq!(config.min_score, Some(0.6));
        assert!(config.parallel);

        let engine = config.engine_config();
        assert_eq!(engine.cv_folds, 5);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trainer.json");
        std::fs::write(&path, r#"{"cv_folds": 1}"#).unwrap();
        let err = TrainerConfig::from_file(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        std::fs::write(&path, "not json").unwrap();
        let err = TrainerConfig::from_file(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
