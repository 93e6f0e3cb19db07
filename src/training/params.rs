//! Hyperparameter values, parameter sets and grids

use crate::error::{Result, SelectorError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single hyperparameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    String(String),
    Bool(bool),
    /// Unset optional hyperparameter
    Null,
}

impl ParamValue {
    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get as int
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::String(v) => write!(f, "'{}'", v),
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Null => write!(f, "None"),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ParamValue::Null, Into::into)
    }
}

/// A concrete hyperparameter assignment, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as `name=value` pairs for metadata
    pub fn to_string_map(&self) -> BTreeMap<String, String> {
        self.0.iter().map(|(k, v)| (k.clone(), v.to_string())).collect()
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{}': {}", name, value)?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(String, ParamValue)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Ordered grid of candidate values per hyperparameter
///
/// Combinations are produced in declaration order with the last declared
/// hyperparameter varying fastest. Grid search breaks score ties in favour
/// of the earliest combination, so this order is the tie-break.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    entries: Vec<(String, Vec<ParamValue>)>,
}

impl ParamGrid {
    /// An empty grid: one combination, the model defaults
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Add a hyperparameter with its candidate values
    pub fn values<V: Into<ParamValue>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.entries
            .push((name.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    /// Add an integer hyperparameter
    pub fn ints(self, name: impl Into<String>, values: &[i64]) -> Self {
        self.values(name, values.iter().copied())
    }

    /// Add a float hyperparameter
    pub fn floats(self, name: impl Into<String>, values: &[f64]) -> Self {
        self.values(name, values.iter().copied())
    }

    /// Add a categorical hyperparameter
    pub fn categorical(self, name: impl Into<String>, values: &[&str]) -> Self {
        self.values(name, values.iter().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hyperparameter names in declaration order
    pub fn param_names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Number of combinations the grid expands to
    pub fn n_combinations(&self) -> usize {
        self.entries.iter().map(|(_, values)| values.len()).product()
    }

    /// Check that every hyperparameter has at least one value and no name repeats
    pub fn validate(&self) -> Result<()> {
        for (i, (name, values)) in self.entries.iter().enumerate() {
            if values.is_empty() {
                return Err(SelectorError::InvalidParameter {
                    name: name.clone(),
                    value: "[]".to_string(),
                    reason: "grid entry has no candidate values".to_string(),
                });
            }
            if self.entries[..i].iter().any(|(other, _)| other == name) {
                return Err(SelectorError::ConfigError(format!(
                    "hyperparameter '{}' declared twice in grid",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Expand into every combination, in generation order
    pub fn combinations(&self) -> Vec<Params> {
        let mut combos = vec![Params::new()];
        for (name, values) in &self.entries {
            let mut next = Vec::with_capacity(combos.len() * values.len());
            for combo in &combos {
                for value in values {
                    let mut extended = combo.clone();
                    extended.insert(name.clone(), value.clone());
                    next.push(extended);
                }
            }
            combos = next;
        }
        combos
    }
}

/// Read a positive integer hyperparameter
pub(crate) fn expect_usize(name: &str, value: &ParamValue) -> Result<usize> {
    match value.as_int() {
        Some(v) if v > 0 => Ok(v as usize),
        _ => Err(invalid(name, value, "expected a positive integer")),
    }
}

/// Read an optional positive integer hyperparameter
pub(crate) fn expect_optional_usize(name: &str, value: &ParamValue) -> Result<Option<usize>> {
    match value {
        ParamValue::Null => Ok(None),
        other => expect_usize(name, other).map(Some),
    }
}

/// Read an optional seed
pub(crate) fn expect_seed(name: &str, value: &ParamValue) -> Result<Option<u64>> {
    match value {
        ParamValue::Null => Ok(None),
        ParamValue::Int(v) if *v >= 0 => Ok(Some(*v as u64)),
        other => Err(invalid(name, other, "expected a non-negative integer or None")),
    }
}

/// Read a float hyperparameter (integers are widened)
pub(crate) fn expect_f64(name: &str, value: &ParamValue) -> Result<f64> {
    value
        .as_float()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(name, value, "expected a finite number"))
}

/// Read a float hyperparameter in `(low, high]`
pub(crate) fn expect_f64_in(name: &str, value: &ParamValue, low: f64, high: f64) -> Result<f64> {
    let v = expect_f64(name, value)?;
    if v > low && v <= high {
        Ok(v)
    } else {
        Err(invalid(name, value, &format!("expected a value in ({}, {}]", low, high)))
    }
}

/// Read a boolean hyperparameter
pub(crate) fn expect_bool(name: &str, value: &ParamValue) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| invalid(name, value, "expected a boolean"))
}

pub(crate) fn invalid(name: &str, value: &ParamValue, reason: &str) -> SelectorError {
    SelectorError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub(crate) fn unknown(model: &str, name: &str, value: &ParamValue) -> SelectorError {
    SelectorError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: format!("not a hyperparameter of {}", model),
    }
}
