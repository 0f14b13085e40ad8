//! Sparse named feature vectors.
//!
//! Edges carry the feature values produced by the decoder; a weights file maps
//! the same names to model weights. Scoring an edge is their dot product.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum WeightsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// A sparse map from feature name to value. Absent names read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SparseVector {
    values: BTreeMap<String, f64>,
}

impl SparseVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Add every entry of `other` into `self`.
    pub fn add_assign(&mut self, other: &SparseVector) {
        for (name, value) in other.iter() {
            *self.values.entry(name.to_string()).or_insert(0.0) += value;
        }
    }

    /// Dot product; iterates over the smaller of the two vectors.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .values
            .iter()
            .map(|(name, value)| value * large.get(name))
            .sum()
    }

    /// Parse a weights file: one `name value` pair per line.
    ///
    /// Blank lines and lines starting with `#` are skipped. Values must be
    /// finite numbers.
    pub fn from_text(text: &str) -> Result<Self, WeightsError> {
        let mut weights = Self::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(name), Some(value), None) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(WeightsError::Parse {
                    line: i + 1,
                    message: format!("expected 'name value', got '{line}'"),
                });
            };
            let value = parse_finite(value).ok_or_else(|| WeightsError::Parse {
                line: i + 1,
                message: format!("invalid weight '{value}' for {name}"),
            })?;
            weights.set(name, value);
        }
        Ok(weights)
    }

    pub fn load(path: &Path) -> Result<Self, WeightsError> {
        let text = fs::read_to_string(path)?;
        Self::from_text(&text)
    }
}

impl<'a> FromIterator<(&'a str, f64)> for SparseVector {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        let mut v = Self::new();
        for (name, value) in iter {
            v.set(name, value);
        }
        v
    }
}

/// Parse a float, rejecting NaN and infinities.
pub(crate) fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}
