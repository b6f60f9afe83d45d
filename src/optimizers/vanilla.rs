//! Vanilla gradient descent
//!
//! This module provides the stateless update rule that performs the basic
//! gradient descent step: `x' = x - learning_rate * gradient`

use super::{
    evaluate_gradient, validate_learning_rate, GradientFn, Hyperparameters, OptimizerState,
    UpdateRule,
};
use crate::error::{Error, Result};

/// Vanilla gradient descent.
///
/// Implements the basic update rule without momentum or adaptive learning
/// rates:
///
/// `x' = x - α * ∇F(x)`
///
/// Whether this is batch, stochastic or mini-batch gradient descent depends
/// only on which samples the driver averages the gradient over; see
/// [`BatchSize`](crate::utils::sampler::BatchSize).
///
/// # Example
///
/// ```
/// use rust_gradient_descent::optimizers::{UpdateRule, Vanilla};
///
/// let gd = Vanilla::new(0.1).unwrap();
/// let (next, _) = gd
///     .step(gd.init(1), &[2.0], &mut |_: &[f64]| Ok(vec![1.0]))
///     .unwrap();
/// assert_eq!(next, vec![1.9]);
/// ```
///
/// # Limitations
///
/// Vanilla descent is slow in narrow curved valleys such as Rosenbrock's and
/// oscillates across them when the learning rate is large.
#[derive(Debug, Clone)]
pub struct Vanilla {
    hyperparameters: Hyperparameters,
}

impl Vanilla {
    /// Creates a vanilla rule with the given learning rate.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidHyperparameter`] unless `learning_rate` is finite and > 0.
    ///
    /// # Typical Values
    ///
    /// Common learning rates range from 0.001 to 0.1, depending on the problem:
    /// - 0.001: safe on Rosenbrock from typical starting points
    /// - 0.01: good starting point for logistic regression
    /// - 0.1: aggressive, may diverge on badly scaled objectives
    pub fn new(learning_rate: f64) -> Result<Self> {
        Self::from_hyperparameters(Hyperparameters::with_learning_rate(learning_rate))
    }

    pub fn from_hyperparameters(hyperparameters: Hyperparameters) -> Result<Self> {
        validate_learning_rate(hyperparameters.learning_rate)?;
        Ok(Self { hyperparameters })
    }
}

impl UpdateRule for Vanilla {
    fn name(&self) -> &'static str {
        "vanilla"
    }

    fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    fn init(&self, _dimension: usize) -> OptimizerState {
        OptimizerState::Stateless
    }

    fn step(
        &self,
        state: OptimizerState,
        params: &[f64],
        gradient: &mut GradientFn<'_>,
    ) -> Result<(Vec<f64>, OptimizerState)> {
        if state != OptimizerState::Stateless {
            return Err(Error::StateMismatch {
                optimizer: self.name(),
                found: state.kind(),
            });
        }

        let g = evaluate_gradient(gradient, params, params.len())?;
        let lr = self.hyperparameters.learning_rate;
        let next = params
            .iter()
            .zip(g.iter())
            .map(|(x, g)| x - lr * g)
            .collect();

        Ok((next, OptimizerState::Stateless))
    }
}
