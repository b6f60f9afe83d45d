//! Objective functions to minimize
//!
//! An [`Objective`] maps a parameter vector to a scalar loss and may supply a
//! closed-form gradient. When it does not, the driver falls back to
//! [`numeric_gradient`](crate::utils::numeric::numeric_gradient).
//!
//! Dataset-backed objectives also implement [`SampledObjective`], which lets
//! the driver evaluate the loss and gradient on a subset of samples for
//! stochastic and mini-batch descent.
//!
//! # Available Objectives
//!
//! - [`Rosenbrock`]: the banana-shaped non-convex benchmark
//! - [`LogisticRegression`]: average cross-entropy of a linear classifier
//! - [`FnObjective`]: wraps a closure for ad-hoc functions

pub mod logistic;
pub mod rosenbrock;

pub use logistic::{Dataset, InMemoryDataset, LogisticRegression};
pub use rosenbrock::Rosenbrock;

/// A scalar function of a fixed-length parameter vector.
pub trait Objective {
    /// Length of the parameter vectors this objective accepts.
    fn dimension(&self) -> usize;

    /// Loss at `params`. May be NaN or infinite outside the function's domain.
    fn loss(&self, params: &[f64]) -> f64;

    /// Closed-form gradient at `params`, if the objective has one.
    fn gradient(&self, _params: &[f64]) -> Option<Vec<f64>> {
        None
    }
}

/// An objective that is an average over a fixed set of samples.
pub trait SampledObjective: Objective {
    /// Number of samples the full loss averages over.
    fn num_samples(&self) -> usize;

    /// Average loss over the samples named by `indices`.
    fn batch_loss(&self, params: &[f64], indices: &[usize]) -> f64;

    /// Average closed-form gradient over the samples named by `indices`.
    fn batch_gradient(&self, _params: &[f64], _indices: &[usize]) -> Option<Vec<f64>> {
        None
    }
}

type LossFn<'a> = Box<dyn Fn(&[f64]) -> f64 + 'a>;
type GradientFn<'a> = Box<dyn Fn(&[f64]) -> Vec<f64> + 'a>;

/// Objective built from closures.
///
/// # Example
///
/// ```
/// use rust_gradient_descent::objectives::{FnObjective, Objective};
///
/// let bowl = FnObjective::new(2, |x: &[f64]| x[0] * x[0] + x[1] * x[1])
///     .with_gradient(|x: &[f64]| vec![2.0 * x[0], 2.0 * x[1]]);
/// assert_eq!(bowl.loss(&[1.0, 2.0]), 5.0);
/// assert_eq!(bowl.gradient(&[1.0, 2.0]), Some(vec![2.0, 4.0]));
/// ```
pub struct FnObjective<'a> {
    dimension: usize,
    loss: LossFn<'a>,
    gradient: Option<GradientFn<'a>>,
}

impl<'a> FnObjective<'a> {
    /// Wraps a loss closure over `dimension`-length vectors.
    pub fn new<F>(dimension: usize, loss: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + 'a,
    {
        Self {
            dimension,
            loss: Box::new(loss),
            gradient: None,
        }
    }

    /// Attaches a closed-form gradient.
    pub fn with_gradient<G>(mut self, gradient: G) -> Self
    where
        G: Fn(&[f64]) -> Vec<f64> + 'a,
    {
        self.gradient = Some(Box::new(gradient));
        self
    }
}

impl Objective for FnObjective<'_> {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn loss(&self, params: &[f64]) -> f64 {
        (self.loss)(params)
    }

    fn gradient(&self, params: &[f64]) -> Option<Vec<f64>> {
        self.gradient.as_ref().map(|g| g(params))
    }
}
