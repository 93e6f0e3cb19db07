//! Error types for model selection
//!
//! Every failure inside the engine or the trainer is carried as a
//! [`SelectorError`]. Errors that cross a component boundary are wrapped with
//! [`ResultExt::located`], which records the call site and a short context
//! string. A located error renders in the fixed, user-facing shape:
//!
//! ```text
//! Error occurred in Rust script name [src/training/engine.rs] line number [88] error message [...]
//! ```

use std::panic::Location;
use thiserror::Error;

/// Result type alias for model selection operations
pub type Result<T> = std::result::Result<T, SelectorError>;

/// Coarse classification of failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Mismatched feature/target dimensions or column layouts
    InputShape,
    /// A model rejected its hyperparameters or failed to fit/predict
    Fitting,
    /// Artifact or log file could not be read, written or decoded
    Io,
    /// Inconsistent roster/grid or invalid settings
    Configuration,
    /// Input data could not be read or converted to numbers
    Data,
    /// The best model missed the quality threshold
    Selection,
}

/// Source position captured when an error is wrapped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLocation {
    pub file: String,
    pub line: u32,
}

impl ErrorLocation {
    fn from_caller(location: &Location<'_>) -> Self {
        Self {
            file: location.file().to_string(),
            line: location.line(),
        }
    }
}

/// Main error type
#[derive(Error, Debug)]
pub enum SelectorError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Convergence failed after {iterations} iterations")]
    ConvergenceError { iterations: usize },

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Corrupt artifact: {0}")]
    CorruptArtifact(String),

    #[error("Best model {name} scored {score:.4}, below the required {threshold:.4}")]
    BelowThreshold {
        name: String,
        score: f64,
        threshold: f64,
    },

    #[error(
        "Error occurred in Rust script name [{}] line number [{}] error message [{inner}]",
        .location.file,
        .location.line
    )]
    Located {
        #[source]
        inner: Box<SelectorError>,
        location: ErrorLocation,
        context: String,
    },
}

impl SelectorError {
    /// Kind of the innermost error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SelectorError::ShapeError { .. } => ErrorKind::InputShape,
            SelectorError::TrainingError(_)
            | SelectorError::InvalidParameter { .. }
            | SelectorError::ModelNotFitted
            | SelectorError::ConvergenceError { .. }
            | SelectorError::ComputationError(_) => ErrorKind::Fitting,
            SelectorError::IoError(_)
            | SelectorError::SerializationError(_)
            | SelectorError::CorruptArtifact(_) => ErrorKind::Io,
            SelectorError::ValidationError(_) | SelectorError::ConfigError(_) => {
                ErrorKind::Configuration
            }
            SelectorError::DataError(_) => ErrorKind::Data,
            SelectorError::BelowThreshold { .. } => ErrorKind::Selection,
            SelectorError::Located { inner, .. } => inner.kind(),
        }
    }

    /// Wrap this error with a source location and context
    pub fn at(self, location: &Location<'_>, context: impl Into<String>) -> Self {
        SelectorError::Located {
            inner: Box::new(self),
            location: ErrorLocation::from_caller(location),
            context: context.into(),
        }
    }

    /// Wrap this error with the caller's location
    #[track_caller]
    pub fn located(self, context: impl Into<String>) -> Self {
        self.at(Location::caller(), context)
    }

    /// Innermost error, skipping location wrappers
    pub fn root(&self) -> &SelectorError {
        match self {
            SelectorError::Located { inner, .. } => inner.root(),
            other => other,
        }
    }

    /// Context strings from the outermost wrapper inwards
    pub fn contexts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut current = self;
        while let SelectorError::Located { inner, context, .. } = current {
            out.push(context.as_str());
            current = inner;
        }
        out
    }

    /// Location of the outermost wrapper, if any
    pub fn location(&self) -> Option<&ErrorLocation> {
        match self {
            SelectorError::Located { location, .. } => Some(location),
            _ => None,
        }
    }
}

/// Attach call-site information to a failing result
pub trait ResultExt<T> {
    /// Wrap the error, if any, with the caller's file/line and `context`
    fn located(self, context: &str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<SelectorError>,
{
    #[track_caller]
    fn located(self, context: &str) -> Result<T> {
        let caller = Location::caller();
        match self {
            Ok(value) => Ok(value),
            Err(e) => Err(e.into().at(caller, context)),
        }
    }
}

impl From<polars::error::PolarsError> for SelectorError {
    fn from(err: polars::error::PolarsError) -> Self {
        SelectorError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for SelectorError {
    fn from(err: serde_json::Error) -> Self {
        SelectorError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for SelectorError {
    fn from(err: bincode::Error) -> Self {
        SelectorError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for SelectorError {
    fn from(err: ndarray::ShapeError) -> Self {
        SelectorError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
