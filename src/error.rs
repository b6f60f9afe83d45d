//! Error types for the optimizer core
//!
//! Configuration and contract violations are reported through [`Error`].
//! Numerical divergence is not an error: it ends a run with
//! [`RunOutcome::Diverged`](crate::driver::RunOutcome::Diverged) so callers
//! can observe it in the trajectory.

use thiserror::Error;

/// Errors raised by update rules, objectives, the driver and config loading.
#[derive(Error, Debug)]
pub enum Error {
    /// A gradient, state or parameter vector has the wrong length.
    #[error("dimension mismatch in {context}: expected {expected}, got {found}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    /// A hyperparameter is outside its valid range.
    #[error("invalid hyperparameter {name} = {value}: {reason}")]
    InvalidHyperparameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// An update rule was handed state created by a different rule.
    #[error("{optimizer} cannot step with {found} state")]
    StateMismatch {
        optimizer: &'static str,
        found: &'static str,
    },

    /// Finite-difference step must be finite and strictly positive.
    #[error("invalid finite-difference step {0}: must be finite and > 0")]
    InvalidStepSize(f64),

    #[error("invalid batch size {batch} for a dataset of {samples} samples")]
    InvalidBatchSize { batch: usize, samples: usize },

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("label {label} at sample {index} is not 0 or 1")]
    InvalidLabel { index: usize, label: f64 },

    #[error("configuration error: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Returns `DimensionMismatch` unless `found == expected`.
pub(crate) fn check_dimension(context: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::DimensionMismatch {
            context,
            expected,
            found,
        })
    }
}
