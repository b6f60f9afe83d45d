//! Numerical gradients by symmetric finite differences
//!
//! The central difference
//!
//! ```text
//! g[i] = (F(x + h·e_i) - F(x - h·e_i)) / (2h)
//! ```
//!
//! has truncation error O(h²), against O(h) for the forward difference
//! `(F(x + h·e_i) - F(x)) / h`. Gradient comparisons between optimizers rely on
//! that accuracy, so only the central form is provided.

use crate::error::{check_dimension, Error, Result};

/// Default finite-difference step.
pub const DEFAULT_STEP: f64 = 1e-3;

/// Approximates the gradient of `f` at `x` with central differences.
///
/// Evaluates `f` exactly `2 * x.len()` times. `x` is not modified; the
/// perturbed points are built in a private buffer. Non-finite values of `f`
/// propagate into the result unchanged.
///
/// # Errors
///
/// Returns [`Error::InvalidStepSize`] if `h` is not finite and strictly positive.
///
/// # Examples
///
/// ```
/// use rust_gradient_descent::utils::numeric::numeric_gradient;
///
/// let f = |x: &[f64]| x[0] * x[0] + 3.0 * x[1];
/// let g = numeric_gradient(f, &[2.0, 0.0], 1e-4).unwrap();
/// assert!((g[0] - 4.0).abs() < 1e-8);
/// assert!((g[1] - 3.0).abs() < 1e-8);
/// ```
pub fn numeric_gradient<F>(f: F, x: &[f64], h: f64) -> Result<Vec<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    if !(h.is_finite() && h > 0.0) {
        return Err(Error::InvalidStepSize(h));
    }

    let mut probe = x.to_vec();
    let mut gradient = Vec::with_capacity(x.len());

    for i in 0..x.len() {
        probe[i] = x[i] + h;
        let forward = f(&probe);
        probe[i] = x[i] - h;
        let backward = f(&probe);
        probe[i] = x[i];

        gradient.push((forward - backward) / (2.0 * h));
    }

    Ok(gradient)
}

/// Largest component-wise relative error between two gradients.
///
/// Uses `|a - n| / max(|a| + |n|, f64::MIN_POSITIVE)`, so components that are
/// both zero contribute zero. This is the usual gradient-check metric: values
/// around 1e-7 or smaller indicate a correct closed-form gradient.
pub fn max_relative_error(analytic: &[f64], numeric: &[f64]) -> Result<f64> {
    check_dimension("gradient check", analytic.len(), numeric.len())?;

    Ok(analytic
        .iter()
        .zip(numeric.iter())
        .map(|(a, n)| (a - n).abs() / (a.abs() + n.abs()).max(f64::MIN_POSITIVE))
        .fold(0.0, f64::max))
}
