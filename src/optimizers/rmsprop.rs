//! RMSprop optimizer (Root Mean Square Propagation).
//!
//! RMSprop divides the learning rate by an exponentially decaying average
//! of squared gradients. Unlike Adagrad the average forgets old gradients, so
//! the effective step size does not shrink towards zero on long runs.
//!
//! Reference: Tieleman & Hinton, "Lecture 6.5-rmsprop",
//! COURSERA: Neural networks for machine learning

use super::{
    evaluate_gradient, validate_decay, validate_epsilon, validate_learning_rate, GradientFn,
    Hyperparameters, OptimizerState, UpdateRule,
};
use crate::error::{check_dimension, Error, Result};

/// RMSprop optimizer.
///
/// ```text
/// s' = ρ * s + (1 - ρ) * g ⊙ g
/// x' = x - α * g / (√s' + ε)
/// ```
#[derive(Debug, Clone)]
pub struct RmsProp {
    hyperparameters: Hyperparameters,
}

impl RmsProp {
    /// # Arguments
    ///
    /// * `learning_rate` - Step scale α (finite, > 0), typically 0.001
    /// * `decay` - Squared-gradient decay ρ in [0, 1), typically 0.9
    /// * `epsilon` - Divide-by-zero guard (finite, > 0), typically 1e-8
    pub fn new(learning_rate: f64, decay: f64, epsilon: f64) -> Result<Self> {
        Self::from_hyperparameters(Hyperparameters {
            learning_rate,
            decay,
            epsilon,
            ..Hyperparameters::default()
        })
    }

    pub fn from_hyperparameters(hyperparameters: Hyperparameters) -> Result<Self> {
        validate_learning_rate(hyperparameters.learning_rate)?;
        validate_decay("decay", hyperparameters.decay)?;
        validate_epsilon(hyperparameters.epsilon)?;
        Ok(Self { hyperparameters })
    }
}

impl UpdateRule for RmsProp {
    fn name(&self) -> &'static str {
        "rmsprop"
    }

    fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    fn init(&self, dimension: usize) -> OptimizerState {
        OptimizerState::SquaredGradientAverage(vec![0.0; dimension])
    }

    fn step(
        &self,
        state: OptimizerState,
        params: &[f64],
        gradient: &mut GradientFn<'_>,
    ) -> Result<(Vec<f64>, OptimizerState)> {
        let mut average = match state {
            OptimizerState::SquaredGradientAverage(s) => s,
            other => {
                return Err(Error::StateMismatch {
                    optimizer: self.name(),
                    found: other.kind(),
                })
            }
        };
        check_dimension("rmsprop average", params.len(), average.len())?;

        let g = evaluate_gradient(gradient, params, params.len())?;
        let lr = self.hyperparameters.learning_rate;
        let rho = self.hyperparameters.decay;
        let eps = self.hyperparameters.epsilon;

        let mut next = Vec::with_capacity(params.len());
        for ((x, g), s) in params.iter().zip(g.iter()).zip(average.iter_mut()) {
            *s = rho * *s + (1.0 - rho) * g * g;
            next.push(x - lr * g / (s.sqrt() + eps));
        }

        Ok((next, OptimizerState::SquaredGradientAverage(average)))
    }
}
