//! Rust Gradient Descent Library
//!
//! First-order optimizers compared on benchmark objectives, with every run
//! recorded as a trajectory of (parameters, loss) points for plotting.
//!
//! # Modules
//!
//! - `optimizers`: UpdateRule trait and implementations (Vanilla, Momentum, Adam, etc.)
//! - `driver`: Iteration loop, stopping policy and trajectory recording
//! - `objectives`: Objective traits, Rosenbrock and logistic regression
//! - `utils`: Numeric gradients, batch sampling and shared math helpers
//! - `config`: JSON run configuration
//! - `error`: Crate-wide error type

pub mod config;
pub mod driver;
pub mod error;
pub mod objectives;
pub mod optimizers;
pub mod utils;

pub use error::{Error, Result};
