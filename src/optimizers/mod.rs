//! Update rules for first-order optimization
//!
//! This module provides the [`UpdateRule`] trait and one implementation per
//! algorithm compared by this crate.
//!
//! # Overview
//!
//! An update rule maps the current point, its optimizer state and a gradient
//! to the next point and the next state. The basic gradient descent update is
//! `x' = x - learning_rate * gradient`; the other rules keep per-parameter
//! state (velocity, accumulated squared gradients, moment estimates) that
//! changes how the gradient is turned into a step.
//!
//! # Available Update Rules
//!
//! - [`Vanilla`]: plain gradient descent, no state
//! - [`Momentum`]: heavy-ball momentum with a velocity vector
//! - [`Nesterov`]: momentum with the gradient taken at a lookahead point
//! - [`Adagrad`]: per-parameter step sizes from the sum of squared gradients
//! - [`RmsProp`]: like Adagrad with an exponential moving average instead
//! - [`Adam`]: bias-corrected first and second moment estimates
//!
//! # State
//!
//! State is an explicit value. [`UpdateRule::init`] creates it, and each call
//! to [`UpdateRule::step`] consumes the current state and returns the next
//! one, so a run never depends on anything hidden inside the rule. Rules hold
//! only their immutable [`Hyperparameters`].
//!
//! # Example
//!
//! ```
//! use rust_gradient_descent::optimizers::{Adam, UpdateRule};
//!
//! let adam = Adam::new(0.001, 0.9, 0.999, 1e-8).unwrap();
//! let state = adam.init(2);
//! let (next, _state) = adam
//!     .step(state, &[1.0, 2.0], &mut |x: &[f64]| Ok(vec![2.0 * x[0], 2.0 * x[1]]))
//!     .unwrap();
//! assert!(next[0] < 1.0 && next[1] < 2.0);
//! ```

pub mod adagrad;
pub mod adam;
pub mod momentum;
pub mod nesterov;
pub mod rmsprop;
pub mod vanilla;

pub use adagrad::Adagrad;
pub use adam::Adam;
pub use momentum::Momentum;
pub use nesterov::Nesterov;
pub use rmsprop::RmsProp;
pub use vanilla::Vanilla;

use serde::Deserialize;
use std::fmt;

use crate::error::{check_dimension, Error, Result};

/// Gradient-evaluation callable handed to [`UpdateRule::step`].
///
/// Returns the gradient of the objective at the given point.
pub type GradientFn<'a> = dyn FnMut(&[f64]) -> Result<Vec<f64>> + 'a;

/// Core trait for update rules.
///
/// All rules receive a gradient callable rather than a precomputed gradient so
/// that [`Nesterov`] can evaluate it at its lookahead point. Every rule calls
/// it exactly once per step.
pub trait UpdateRule {
    /// Short algorithm name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Hyperparameters captured at construction.
    fn hyperparameters(&self) -> &Hyperparameters;

    /// Fresh, zero-initialized state for `dimension` parameters.
    fn init(&self, dimension: usize) -> OptimizerState;

    /// Computes the next point and the next state.
    ///
    /// # Errors
    ///
    /// - [`Error::DimensionMismatch`] if the gradient or the state vectors do
    ///   not have `params.len()` components
    /// - [`Error::StateMismatch`] if `state` was created by a different rule
    /// - any error returned by `gradient`
    fn step(
        &self,
        state: OptimizerState,
        params: &[f64],
        gradient: &mut GradientFn<'_>,
    ) -> Result<(Vec<f64>, OptimizerState)>;
}

/// Per-run optimizer state, one variant per state shape.
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizerState {
    /// Vanilla gradient descent keeps nothing between steps.
    Stateless,
    /// Momentum and Nesterov velocity `v`.
    Velocity(Vec<f64>),
    /// Adagrad running sum of squared gradients.
    SquaredGradientSum(Vec<f64>),
    /// RMSProp exponential moving average of squared gradients.
    SquaredGradientAverage(Vec<f64>),
    /// Adam first moment `m`, second moment `v` and step counter `t`.
    Moments { m: Vec<f64>, v: Vec<f64>, t: u64 },
}

impl OptimizerState {
    /// Name of the variant, used in [`Error::StateMismatch`].
    pub fn kind(&self) -> &'static str {
        match self {
            OptimizerState::Stateless => "stateless",
            OptimizerState::Velocity(_) => "velocity",
            OptimizerState::SquaredGradientSum(_) => "squared-gradient sum",
            OptimizerState::SquaredGradientAverage(_) => "squared-gradient average",
            OptimizerState::Moments { .. } => "moment",
        }
    }
}

/// Hyperparameters shared by the update rules.
///
/// Each rule reads only the fields its equation uses:
///
/// | Field | Used by |
/// |---|---|
/// | `learning_rate` (α) | all |
/// | `momentum` (β) | Momentum, Nesterov |
/// | `decay` (ρ) | RMSProp |
/// | `beta1`, `beta2` | Adam |
/// | `epsilon` (ε) | Adagrad, RMSProp, Adam |
///
/// Missing fields deserialize to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    pub learning_rate: f64,
    pub momentum: f64,
    pub decay: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            momentum: 0.9,
            decay: 0.9,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

impl Hyperparameters {
    /// Defaults with the given learning rate.
    pub fn with_learning_rate(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            ..Self::default()
        }
    }
}

pub(crate) fn validate_learning_rate(value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidHyperparameter {
            name: "learning_rate",
            value,
            reason: "must be finite and > 0",
        })
    }
}

/// Decay coefficients must lie in [0, 1).
pub(crate) fn validate_decay(name: &'static str, value: f64) -> Result<()> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidHyperparameter {
            name,
            value,
            reason: "must be in [0, 1)",
        })
    }
}

pub(crate) fn validate_epsilon(value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidHyperparameter {
            name: "epsilon",
            value,
            reason: "must be finite and > 0",
        })
    }
}

/// Calls `gradient` at `point` and checks the result has `dimension` entries.
pub(crate) fn evaluate_gradient(
    gradient: &mut GradientFn<'_>,
    point: &[f64],
    dimension: usize,
) -> Result<Vec<f64>> {
    let g = gradient(point)?;
    check_dimension("gradient", dimension, g.len())?;
    Ok(g)
}

/// Selects an update rule by name, e.g. from a JSON config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Vanilla,
    Momentum,
    Nesterov,
    Adagrad,
    #[serde(alias = "rms_prop")]
    Rmsprop,
    Adam,
}

impl OptimizerKind {
    /// Every kind, in the order comparisons report them.
    pub const ALL: [OptimizerKind; 6] = [
        OptimizerKind::Vanilla,
        OptimizerKind::Momentum,
        OptimizerKind::Nesterov,
        OptimizerKind::Adagrad,
        OptimizerKind::Rmsprop,
        OptimizerKind::Adam,
    ];

    /// Constructs the rule, validating the hyperparameters it uses.
    pub fn build(self, hyperparameters: Hyperparameters) -> Result<Box<dyn UpdateRule>> {
        Ok(match self {
            OptimizerKind::Vanilla => Box::new(Vanilla::from_hyperparameters(hyperparameters)?),
            OptimizerKind::Momentum => Box::new(Momentum::from_hyperparameters(hyperparameters)?),
            OptimizerKind::Nesterov => Box::new(Nesterov::from_hyperparameters(hyperparameters)?),
            OptimizerKind::Adagrad => Box::new(Adagrad::from_hyperparameters(hyperparameters)?),
            OptimizerKind::Rmsprop => Box::new(RmsProp::from_hyperparameters(hyperparameters)?),
            OptimizerKind::Adam => Box::new(Adam::from_hyperparameters(hyperparameters)?),
        })
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptimizerKind::Vanilla => "vanilla",
            OptimizerKind::Momentum => "momentum",
            OptimizerKind::Nesterov => "nesterov",
            OptimizerKind::Adagrad => "adagrad",
            OptimizerKind::Rmsprop => "rmsprop",
            OptimizerKind::Adam => "adam",
        };
        f.write_str(name)
    }
}
