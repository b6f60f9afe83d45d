//! Rosenbrock function
//!
//! F(x, y) = (a - x)² + b(y - x²)²
//!
//! The global minimum sits at (a, a²) with F = 0, at the bottom of a long,
//! curved, nearly flat valley. Plain gradient descent crawls along the valley
//! floor, which makes the function a standard test of momentum and adaptive
//! step sizes. The classic parameters are a = 1, b = 100.

use serde::Deserialize;

use super::Objective;

/// Two-dimensional Rosenbrock function with closed-form gradient.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Rosenbrock {
    pub a: f64,
    pub b: f64,
}

impl Default for Rosenbrock {
    fn default() -> Self {
        Self { a: 1.0, b: 100.0 }
    }
}

impl Rosenbrock {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    /// Location of the global minimum, (a, a²).
    pub fn minimum(&self) -> [f64; 2] {
        [self.a, self.a * self.a]
    }
}

impl Objective for Rosenbrock {
    fn dimension(&self) -> usize {
        2
    }

    fn loss(&self, params: &[f64]) -> f64 {
        let (x, y) = (params[0], params[1]);
        (self.a - x).powi(2) + self.b * (y - x * x).powi(2)
    }

    /// ∂F/∂x = -2(a - x) - 4bx(y - x²), ∂F/∂y = 2b(y - x²)
    fn gradient(&self, params: &[f64]) -> Option<Vec<f64>> {
        let (x, y) = (params[0], params[1]);
        let valley = y - x * x;
        Some(vec![
            -2.0 * (self.a - x) - 4.0 * self.b * x * valley,
            2.0 * self.b * valley,
        ])
    }
}
