//! Logistic regression loss
//!
//! For weights `w` and a dataset of (features, label) pairs with labels in
//! {0, 1}, the loss is the average binary cross-entropy
//!
//! ```text
//! L(w) = (1/N) Σ [ softplus(z_i) - y_i z_i ],   z_i = w · x_i
//! ```
//!
//! which equals `-(1/N) Σ [ y log σ(z) + (1 - y) log(1 - σ(z)) ]` but cannot
//! overflow. Its gradient is `(1/N) Σ (σ(z_i) - y_i) x_i`.
//!
//! There is no separate bias term: append a constant 1.0 feature to every
//! sample to fit an intercept.

use rand::Rng;

use super::{Objective, SampledObjective};
use crate::error::{check_dimension, Error, Result};
use crate::utils::activations::{sigmoid, softplus};
use crate::utils::linalg::dot;

/// Index-addressable collection of labelled samples.
pub trait Dataset {
    /// Number of samples.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width of every feature vector.
    fn num_features(&self) -> usize;

    /// Feature vector of sample `index`.
    fn features(&self, index: usize) -> &[f64];

    /// Label of sample `index`, 0.0 or 1.0.
    fn label(&self, index: usize) -> f64;
}

/// Dataset held in memory as row vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryDataset {
    features: Vec<Vec<f64>>,
    labels: Vec<f64>,
    num_features: usize,
}

impl InMemoryDataset {
    /// Builds a dataset from feature rows and labels.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`] if there are no rows
    /// - [`Error::DimensionMismatch`] if the label count differs from the row
    ///   count or a row is narrower/wider than the first
    /// - [`Error::InvalidLabel`] if a label is not exactly 0.0 or 1.0
    pub fn new(features: Vec<Vec<f64>>, labels: Vec<f64>) -> Result<Self> {
        if features.is_empty() {
            return Err(Error::EmptyDataset);
        }
        check_dimension("dataset labels", features.len(), labels.len())?;

        let num_features = features[0].len();
        for row in &features {
            check_dimension("dataset row", num_features, row.len())?;
        }
        for (index, &label) in labels.iter().enumerate() {
            if label != 0.0 && label != 1.0 {
                return Err(Error::InvalidLabel { index, label });
            }
        }

        Ok(Self {
            features,
            labels,
            num_features,
        })
    }

    /// Draws `samples` points from a logistic model with known weights.
    ///
    /// The first feature of every row is the constant 1.0 (so
    /// `true_weights[0]` acts as the intercept); the others are uniform in
    /// [-2, 2). Each label is 1 with probability `σ(true_weights · x)`.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyDataset`] when `samples == 0` or `true_weights` is empty.
    pub fn synthetic<R: Rng + ?Sized>(
        true_weights: &[f64],
        samples: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if true_weights.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let mut features = Vec::with_capacity(samples);
        let mut labels = Vec::with_capacity(samples);
        for _ in 0..samples {
            let row: Vec<f64> = std::iter::once(1.0)
                .chain((1..true_weights.len()).map(|_| rng.gen_range(-2.0..2.0)))
                .collect();
            let p = sigmoid(dot(true_weights, &row));
            labels.push(if rng.gen::<f64>() < p { 1.0 } else { 0.0 });
            features.push(row);
        }
        Self::new(features, labels)
    }
}

impl Dataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.labels.len()
    }

    fn num_features(&self) -> usize {
        self.num_features
    }

    fn features(&self, index: usize) -> &[f64] {
        &self.features[index]
    }

    fn label(&self, index: usize) -> f64 {
        self.labels[index]
    }
}

/// Average cross-entropy of a linear classifier over a dataset.
#[derive(Debug, Clone)]
pub struct LogisticRegression<D> {
    dataset: D,
}

impl<D: Dataset> LogisticRegression<D> {
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`] if `dataset` has no samples
    /// - [`Error::DimensionMismatch`] if a feature row is not
    ///   `num_features()` wide
    pub fn new(dataset: D) -> Result<Self> {
        if dataset.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let width = dataset.num_features();
        for index in 0..dataset.len() {
            check_dimension("dataset row", width, dataset.features(index).len())?;
        }
        Ok(Self { dataset })
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    /// Predicted probability of label 1 for sample `index`.
    pub fn predict(&self, weights: &[f64], index: usize) -> f64 {
        sigmoid(dot(weights, self.dataset.features(index)))
    }

    /// Fraction of samples whose thresholded prediction matches the label.
    pub fn accuracy(&self, weights: &[f64]) -> f64 {
        let correct = (0..self.dataset.len())
            .filter(|&i| {
                let predicted = if self.predict(weights, i) >= 0.5 { 1.0 } else { 0.0 };
                predicted == self.dataset.label(i)
            })
            .count();
        correct as f64 / self.dataset.len() as f64
    }

    fn sample_loss(&self, weights: &[f64], index: usize) -> f64 {
        let z = dot(weights, self.dataset.features(index));
        softplus(z) - self.dataset.label(index) * z
    }

    fn mean_loss<I: ExactSizeIterator<Item = usize>>(&self, weights: &[f64], indices: I) -> f64 {
        let n = indices.len();
        if n == 0 {
            return 0.0;
        }
        indices.map(|i| self.sample_loss(weights, i)).sum::<f64>() / n as f64
    }

    fn mean_gradient<I: ExactSizeIterator<Item = usize>>(
        &self,
        weights: &[f64],
        indices: I,
    ) -> Vec<f64> {
        let n = indices.len();
        let mut gradient = vec![0.0; self.dataset.num_features()];
        if n == 0 {
            return gradient;
        }
        for i in indices {
            let features = self.dataset.features(i);
            let residual = sigmoid(dot(weights, features)) - self.dataset.label(i);
            for (g, x) in gradient.iter_mut().zip(features.iter()) {
                *g += residual * x;
            }
        }
        let scale = 1.0 / n as f64;
        for g in gradient.iter_mut() {
            *g *= scale;
        }
        gradient
    }
}

impl<D: Dataset> Objective for LogisticRegression<D> {
    fn dimension(&self) -> usize {
        self.dataset.num_features()
    }

    fn loss(&self, params: &[f64]) -> f64 {
        self.mean_loss(params, 0..self.dataset.len())
    }

    fn gradient(&self, params: &[f64]) -> Option<Vec<f64>> {
        Some(self.mean_gradient(params, 0..self.dataset.len()))
    }
}

impl<D: Dataset> SampledObjective for LogisticRegression<D> {
    fn num_samples(&self) -> usize {
        self.dataset.len()
    }

    fn batch_loss(&self, params: &[f64], indices: &[usize]) -> f64 {
        self.mean_loss(params, indices.iter().copied())
    }

    fn batch_gradient(&self, params: &[f64], indices: &[usize]) -> Option<Vec<f64>> {
        Some(self.mean_gradient(params, indices.iter().copied()))
    }
}
