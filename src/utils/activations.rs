//! Scalar link functions for logistic regression
//!
//! This module provides the numerically stable forms used by the logistic
//! loss:
//! - Sigmoid: 1 / (1 + exp(-z)), evaluated without overflow for large |z|
//! - Softplus: ln(1 + exp(z)), the log-partition term of the cross-entropy

/// Sigmoid activation function.
///
/// Returns 1 / (1 + exp(-z)). For negative inputs the algebraically equal
/// form exp(z) / (1 + exp(z)) is used so `exp` never overflows.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Softplus: ln(1 + exp(z)).
///
/// Computed as max(z, 0) + ln(1 + exp(-|z|)) so that large positive inputs
/// do not overflow and large negative inputs do not lose precision.
///
/// The per-sample cross-entropy of a logistic model with logit `z` and
/// label `y` is `softplus(z) - y * z`.
pub fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}
