//! Nesterov accelerated gradient

use super::{
    evaluate_gradient, validate_decay, validate_learning_rate, GradientFn, Hyperparameters,
    OptimizerState, UpdateRule,
};
use crate::error::{check_dimension, Error, Result};

/// Nesterov accelerated gradient.
///
/// Like [`Momentum`](super::Momentum), but the gradient is evaluated at the
/// lookahead point `x - β·v`, where the velocity is about to carry the
/// parameters, rather than at `x`:
///
/// ```text
/// v' = β * v + α * ∇F(x - β * v)
/// x' = x - v'
/// ```
///
/// The correction lets the velocity slow down before it overshoots a valley
/// floor. On the first step `v = 0`, so the lookahead point equals `x`.
#[derive(Debug, Clone)]
pub struct Nesterov {
    hyperparameters: Hyperparameters,
}

impl Nesterov {
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

    /// The point `x - β·v` at which the gradient is evaluated.
    pub fn lookahead(&self, params: &[f64], velocity: &[f64]) -> Vec<f64> {
        let beta = self.hyperparameters.momentum;
        params
            .iter()
            .zip(velocity.iter())
            .map(|(x, v)| x - beta * v)
            .collect()
    }
}

impl UpdateRule for Nesterov {
    fn name(&self) -> &'static str {
        "nesterov"
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
        check_dimension("nesterov velocity", params.len(), velocity.len())?;

        let ahead = self.lookahead(params, &velocity);
        let g = evaluate_gradient(gradient, &ahead, params.len())?;
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
