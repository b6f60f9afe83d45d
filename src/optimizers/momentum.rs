//! Gradient descent with (heavy-ball) momentum

use super::{
    evaluate_gradient, validate_decay, validate_learning_rate, GradientFn, Hyperparameters,
    OptimizerState, UpdateRule,
};
use crate::error::{check_dimension, Error, Result};

/// Momentum optimizer.
///
/// Accumulates a velocity that decays by `β` each step, so consistent
/// gradient directions build up speed while oscillating components cancel:
///
/// ```text
/// v' = β * v + α * ∇F(x)
/// x' = x - v'
/// ```
///
/// With `β = 0` the update is identical to [`Vanilla`](super::Vanilla).
#[derive(Debug, Clone)]
pub struct Momentum {
    hyperparameters: Hyperparameters,
}

impl Momentum {
    /// # Arguments
    ///
    /// * `learning_rate` - Step scale α (finite, > 0)
    /// * `momentum` - Velocity decay β in [0, 1), typically 0.9
    pub fn new(learning_rate: f64, momentum: f64) -> Result<Self> {
        Self::from_hyperparameters(Hyperparameters {
            learning_rate,
            momentum,
            ..Hyperparameters::default()
        })
    }

    pub fn from_hyperparameters(hyperparameters: Hyperparameters) -> Result<Self> {
        validate_learning_rate(hyperparameters.learning_rate)?;
        validate_decay("momentum", hyperparameters.momentum)?;
        Ok(Self { hyperparameters })
    }
}

impl UpdateRule for Momentum {
    fn name(&self) -> &'static str {
        "momentum"
    }

    fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    fn init(&self, dimension: usize) -> OptimizerState {
        OptimizerState::Velocity(vec![0.0; dimension])
    }

    fn step(
        &self,
        state: OptimizerState,
        params: &[f64],
        gradient: &mut GradientFn<'_>,
    ) -> Result<(Vec<f64>, OptimizerState)> {
        let mut velocity = match state {
            OptimizerState::Velocity(v) => v,
            other => {
                return Err(Error::StateMismatch {
                    optimizer: self.name(),
                    found: other.kind(),
                })
            }
        };
        check_dimension("momentum velocity", params.len(), velocity.len())?;

        let g = evaluate_gradient(gradient, params, params.len())?;
        let Hyperparameters {
            learning_rate: lr,
            momentum: beta,
            ..
        } = self.hyperparameters;

        for (v, g) in velocity.iter_mut().zip(g.iter()) {
            *v = beta * *v + lr * g;
        }
        let next = params
            .iter()
            .zip(velocity.iter())
            .map(|(x, v)| x - v)
            .collect();

        Ok((next, OptimizerState::Velocity(velocity)))
    }
}
