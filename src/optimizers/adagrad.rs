//! ADAGRAD optimizer
//!
//! Adagrad scales each parameter's step by the inverse square root of the sum
//! of all squared gradients seen so far. Parameters with large or frequent
//! gradients get small steps; rarely updated ones keep large steps.
//!
//! Reference: Duchi, Hazan & Singer (2011), "Adaptive Subgradient Methods for
//! Online Learning and Stochastic Optimization".

use super::{
    evaluate_gradient, validate_epsilon, validate_learning_rate, GradientFn, Hyperparameters,
    OptimizerState, UpdateRule,
};
use crate::error::{check_dimension, Error, Result};

/// Adagrad optimizer.
///
/// ```text
/// s' = s + g ⊙ g
/// x' = x - α * g / (√s' + ε)
/// ```
///
/// The accumulator only grows, so the effective learning rate decays
/// monotonically and progress can stall on long runs.
#[derive(Debug, Clone)]
pub struct Adagrad {
    hyperparameters: Hyperparameters,
}

impl Adagrad {
    /// # Arguments
    ///
    /// * `learning_rate` - Step scale α (finite, > 0)
    /// * `epsilon` - Divide-by-zero guard (finite, > 0), typically 1e-8
    pub fn new(learning_rate: f64, epsilon: f64) -> Result<Self> {
        Self::from_hyperparameters(Hyperparameters {
            learning_rate,
            epsilon,
            ..Hyperparameters::default()
        })
    }

    pub fn from_hyperparameters(hyperparameters: Hyperparameters) -> Result<Self> {
        validate_learning_rate(hyperparameters.learning_rate)?;
        validate_epsilon(hyperparameters.epsilon)?;
        Ok(Self { hyperparameters })
    }
}

impl UpdateRule for Adagrad {
    fn name(&self) -> &'static str {
        "adagrad"
    }

    fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    fn init(&self, dimension: usize) -> OptimizerState {
        OptimizerState::SquaredGradientSum(vec![0.0; dimension])
    }

    fn step(
        &self,
        state: OptimizerState,
        params: &[f64],
        gradient: &mut GradientFn<'_>,
    ) -> Result<(Vec<f64>, OptimizerState)> {
        let mut sum = match state {
            OptimizerState::SquaredGradientSum(s) => s,
            other => {
                return Err(Error::StateMismatch {
                    optimizer: self.name(),
                    found: other.kind(),
                })
            }
        };
        check_dimension("adagrad accumulator", params.len(), sum.len())?;

        let g = evaluate_gradient(gradient, params, params.len())?;
        let lr = self.hyperparameters.learning_rate;
        let eps = self.hyperparameters.epsilon;

        let mut next = Vec::with_capacity(params.len());
        for ((x, g), s) in params.iter().zip(g.iter()).zip(sum.iter_mut()) {
            *s += g * g;
            next.push(x - lr * g / (s.sqrt() + eps));
        }

        Ok((next, OptimizerState::SquaredGradientSum(sum)))
    }
}
