//! Adam (Adaptive Moment Estimation) optimizer implementation
//!
//! This module provides the Adam optimizer, which combines momentum and
//! adaptive learning rates with bias correction for improved convergence.

use super::{
    evaluate_gradient, validate_decay, validate_epsilon, validate_learning_rate, GradientFn,
    Hyperparameters, OptimizerState, UpdateRule,
};
use crate::error::{check_dimension, Error, Result};

/// Adam (Adaptive Moment Estimation) optimizer.
///
/// Adam combines ideas from momentum optimization and RMSprop to provide
/// adaptive learning rates for each parameter. It maintains two moving
/// averages for each parameter:
///
/// 1. First moment (mean) of gradients (momentum)
/// 2. Second moment (uncentered variance) of gradients (adaptive learning rate)
///
/// The update rule is:
///
/// ```text
/// m_t = β1 * m_{t-1} + (1 - β1) * gradient
/// v_t = β2 * v_{t-1} + (1 - β2) * gradient²
/// m_hat = m_t / (1 - β1^t)
/// v_hat = v_t / (1 - β2^t)
/// parameter = parameter - α * m_hat / (√v_hat + ε)
/// ```
///
/// where:
/// - α (alpha) is the learning rate
/// - β1 (beta1) is the exponential decay rate for first moment estimates
/// - β2 (beta2) is the exponential decay rate for second moment estimates
/// - ε (epsilon) is a small constant for numerical stability
/// - t is the 1-based step count held in [`OptimizerState::Moments`]
///
/// Both moments start at zero, which biases them towards zero during the
/// first steps. Dividing by `1 - β^t` removes that bias, so the first update
/// moves each parameter by almost exactly α.
///
/// # Example
///
/// ```
/// use rust_gradient_descent::optimizers::{Adam, OptimizerState, UpdateRule};
///
/// let adam = Adam::new(0.001, 0.9, 0.999, 1e-8).unwrap();
/// let (next, state) = adam
///     .step(adam.init(1), &[1.0], &mut |_: &[f64]| Ok(vec![1.0]))
///     .unwrap();
/// // First step moves by almost exactly α regardless of gradient scale.
/// assert!((next[0] - 0.999).abs() < 1e-9);
/// assert!(matches!(state, OptimizerState::Moments { t: 1, .. }));
/// ```
///
/// # Reference
///
/// Kingma, D. P., & Ba, J. (2014). Adam: A method for stochastic optimization.
/// arXiv preprint arXiv:1412.6980.
#[derive(Debug, Clone)]
pub struct Adam {
    hyperparameters: Hyperparameters,
}

impl Adam {
    /// Creates a new Adam optimizer with the specified hyperparameters.
    ///
    /// # Arguments
    ///
    /// * `learning_rate` - The step size for parameter updates (α, must be positive)
    /// * `beta1` - Exponential decay rate for first moment estimates (0 ≤ β1 < 1)
    /// * `beta2` - Exponential decay rate for second moment estimates (0 ≤ β2 < 1)
    /// * `epsilon` - Small constant for numerical stability (must be positive)
    ///
    /// # Typical Values
    ///
    /// The original Adam paper recommends:
    /// - learning_rate: 0.001
    /// - beta1: 0.9
    /// - beta2: 0.999
    /// - epsilon: 1e-8
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Result<Self> {
        Self::from_hyperparameters(Hyperparameters {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            ..Hyperparameters::default()
        })
    }

    /// Adam with the paper's β1, β2 and ε and the given learning rate.
    pub fn default_params(learning_rate: f64) -> Result<Self> {
        Self::new(learning_rate, 0.9, 0.999, 1e-8)
    }

    pub fn from_hyperparameters(hyperparameters: Hyperparameters) -> Result<Self> {
        validate_learning_rate(hyperparameters.learning_rate)?;
        validate_decay("beta1", hyperparameters.beta1)?;
        validate_decay("beta2", hyperparameters.beta2)?;
        validate_epsilon(hyperparameters.epsilon)?;
        Ok(Self { hyperparameters })
    }
}

impl UpdateRule for Adam {
    fn name(&self) -> &'static str {
        "adam"
    }

    fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    fn init(&self, dimension: usize) -> OptimizerState {
        OptimizerState::Moments {
            m: vec![0.0; dimension],
            v: vec![0.0; dimension],
            t: 0,
        }
    }

    /// Applies the Adam update with bias correction:
    /// 1. Update biased first moment estimate (momentum)
    /// 2. Update biased second moment estimate (adaptive learning rate)
    /// 3. Compute bias-corrected first moment estimate
    /// 4. Compute bias-corrected second moment estimate
    /// 5. Update parameters using corrected estimates
    fn step(
        &self,
        state: OptimizerState,
        params: &[f64],
        gradient: &mut GradientFn<'_>,
    ) -> Result<(Vec<f64>, OptimizerState)> {
        let (mut m, mut v, t) = match state {
            OptimizerState::Moments { m, v, t } => (m, v, t),
            other => {
                return Err(Error::StateMismatch {
                    optimizer: self.name(),
                    found: other.kind(),
                })
            }
        };
        check_dimension("adam first moment", params.len(), m.len())?;
        check_dimension("adam second moment", params.len(), v.len())?;

        let g = evaluate_gradient(gradient, params, params.len())?;
        let Hyperparameters {
            learning_rate: lr,
            beta1,
            beta2,
            epsilon,
            ..
        } = self.hyperparameters;

        // Increment time step
        let t = t + 1;

        // Compute bias correction factors
        let exponent = i32::try_from(t).unwrap_or(i32::MAX);
        let bias_correction1 = 1.0 - beta1.powi(exponent);
        let bias_correction2 = 1.0 - beta2.powi(exponent);

        let mut next = Vec::with_capacity(params.len());
        for i in 0..params.len() {
            m[i] = beta1 * m[i] + (1.0 - beta1) * g[i];
            v[i] = beta2 * v[i] + (1.0 - beta2) * g[i] * g[i];

            let m_hat = m[i] / bias_correction1;
            let v_hat = v[i] / bias_correction2;

            next.push(params[i] - lr * m_hat / (v_hat.sqrt() + epsilon));
        }

        Ok((next, OptimizerState::Moments { m, v, t }))
    }
}
