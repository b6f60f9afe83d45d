//! Shared utilities for the optimizer core
//!
//! This module provides the numeric differentiator, batch sampling for
//! stochastic runs, the logistic link functions, and small vector helpers.

pub mod activations;
pub mod linalg;
pub mod numeric;
pub mod sampler;

pub use activations::{sigmoid, softplus};
pub use numeric::{max_relative_error, numeric_gradient, DEFAULT_STEP};
pub use sampler::{BatchSampler, BatchSize};
