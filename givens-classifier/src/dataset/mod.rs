pub mod mnist;
pub mod pca;

use crate::error::ConfigError;
use ndarray::Array2;

/// Train and test splits with one-hot labels, fixed for the whole run.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub train_features: Array2<f32>,
    pub train_labels: Array2<f32>,
    pub test_features: Array2<f32>,
    pub test_labels: Array2<f32>,
}

impl Dataset {
    pub fn input_dim(&self) -> usize {
        self.train_features.ncols()
    }

    pub fn num_classes(&self) -> usize {
        self.train_labels.ncols()
    }

    pub fn train_size(&self) -> usize {
        self.train_features.nrows()
    }

    pub fn test_size(&self) -> usize {
        self.test_features.nrows()
    }
}

/// Validates a digit subset and returns the class list, in one-hot column order.
pub fn select_digits(digits: Option<&[u8]>) -> Result<Vec<u8>, ConfigError> {
    let digits = match digits {
        None => return Ok((0..10).collect()),
        Some(digits) => digits,
    };
    let invalid = |reason: &str| ConfigError::InvalidDigits {
        digits: digits.to_vec(),
        reason: reason.to_string(),
    };
    if digits.is_empty() {
        return Err(invalid("at least one digit is required"));
    }
    if digits.iter().any(|&d| d > 9) {
        return Err(invalid("digits must be between 0 and 9"));
    }
    for (i, d) in digits.iter().enumerate() {
        if digits[..i].contains(d) {
            return Err(invalid("digits must be unique"));
        }
    }
    Ok(digits.to_vec())
}

/// One-hot encodes `labels` against `classes`. Rows whose label is not a
/// class are all zero.
pub fn one_hot(labels: &[u8], classes: &[u8]) -> Array2<f32> {
    Array2::from_shape_fn((labels.len(), classes.len()), |(i, j)| {
        if labels[i] == classes[j] {
            1.0
        } else {
            0.0
        }
    })
}
