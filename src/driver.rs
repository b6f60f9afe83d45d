//! Optimization driver
//!
//! The [`Driver`] repeatedly evaluates a gradient, asks an [`UpdateRule`] for
//! the next point, records the loss there, and stops on the first of:
//!
//! - a non-finite gradient, point or loss ([`RunOutcome::Diverged`])
//! - a step shorter than the step tolerance, or a loss below the loss
//!   tolerance ([`RunOutcome::Converged`])
//! - the iteration budget ([`RunOutcome::MaxIterations`])
//!
//! Every visited point is kept in a [`Trajectory`], starting with the initial
//! point, so a run of `N` iterations without early stop holds `N + 1` entries.
//!
//! # Example
//!
//! ```
//! use rust_gradient_descent::driver::{Driver, StoppingPolicy};
//! use rust_gradient_descent::objectives::Rosenbrock;
//! use rust_gradient_descent::optimizers::Adam;
//!
//! let driver = Driver::new(StoppingPolicy::new(500));
//! let adam = Adam::default_params(0.05).unwrap();
//! let run = driver.minimize(&Rosenbrock::default(), &[-1.5, 2.0], &adam).unwrap();
//!
//! assert_eq!(run.trajectory.len(), 501);
//! assert!(run.final_loss() < run.trajectory.first().unwrap().loss);
//! ```

use rand::Rng;

use crate::error::{check_dimension, Error, Result};
use crate::objectives::{Objective, SampledObjective};
use crate::optimizers::UpdateRule;
use crate::utils::linalg::{all_finite, distance};
use crate::utils::numeric::{numeric_gradient, DEFAULT_STEP};
use crate::utils::sampler::{BatchSampler, BatchSize};

/// When to stop iterating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoppingPolicy {
    /// Upper bound on the number of update steps.
    pub max_iterations: usize,
    /// Stop once ‖x' - x‖₂ falls below this value.
    pub step_tolerance: Option<f64>,
    /// Stop once the loss falls below this value.
    pub loss_tolerance: Option<f64>,
}

impl StoppingPolicy {
    /// Runs exactly `max_iterations` steps unless the run diverges.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            step_tolerance: None,
            loss_tolerance: None,
        }
    }

    pub fn with_step_tolerance(mut self, tolerance: f64) -> Self {
        self.step_tolerance = Some(tolerance);
        self
    }

    pub fn with_loss_tolerance(mut self, tolerance: f64) -> Self {
        self.loss_tolerance = Some(tolerance);
        self
    }

    /// Tolerances, when set, must be finite and strictly positive.
    pub fn validate(&self) -> Result<()> {
        for (name, tolerance) in [
            ("step_tolerance", self.step_tolerance),
            ("loss_tolerance", self.loss_tolerance),
        ] {
            if let Some(value) = tolerance {
                if !(value.is_finite() && value > 0.0) {
                    return Err(Error::InvalidConfig(format!(
                        "{} must be finite and > 0, got {}",
                        name, value
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Which tolerance ended a converged run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCriterion {
    StepSize,
    Loss,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// A tolerance was met after `iteration` steps.
    Converged {
        iteration: usize,
        criterion: StopCriterion,
    },
    /// The iteration budget was used up.
    MaxIterations,
    /// A NaN or infinite value appeared at `iteration` (0 = initial point).
    /// The offending entry is the last point of the trajectory.
    Diverged { iteration: usize },
}

/// One visited point and the loss there.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPoint {
    pub params: Vec<f64>,
    pub loss: f64,
}

/// Ordered record of the points visited by a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    fn push(&mut self, params: Vec<f64>, loss: f64) {
        self.points.push(TrajectoryPoint { params, loss });
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrajectoryPoint> {
        self.points.get(index)
    }

    pub fn first(&self) -> Option<&TrajectoryPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TrajectoryPoint> {
        self.points.last()
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrajectoryPoint> {
        self.points.iter()
    }

    /// Loss values in visiting order, for convergence curves.
    pub fn losses(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.loss)
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a TrajectoryPoint;
    type IntoIter = std::slice::Iter<'a, TrajectoryPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct Run {
    /// Name of the update rule that produced the run.
    pub optimizer: &'static str,
    pub trajectory: Trajectory,
    pub outcome: RunOutcome,
}

impl Run {
    pub fn is_diverged(&self) -> bool {
        matches!(self.outcome, RunOutcome::Diverged { .. })
    }

    pub fn is_converged(&self) -> bool {
        matches!(self.outcome, RunOutcome::Converged { .. })
    }

    /// Number of update steps taken.
    pub fn iterations(&self) -> usize {
        self.trajectory.len().saturating_sub(1)
    }

    /// Last recorded point. A run always records at least the initial point.
    pub fn final_point(&self) -> &[f64] {
        self.trajectory
            .last()
            .map(|p| p.params.as_slice())
            .unwrap_or(&[])
    }

    pub fn final_loss(&self) -> f64 {
        self.trajectory.last().map_or(f64::NAN, |p| p.loss)
    }
}

/// Where gradients come from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum GradientSource {
    /// The objective's closed-form gradient when it has one, central
    /// differences with [`DEFAULT_STEP`] otherwise.
    #[default]
    Auto,
    /// Always central differences with the given step, e.g. to check that a
    /// closed-form gradient gives the same trajectory.
    Numeric { step: f64 },
}

/// Runs update rules against objectives under a stopping policy.
#[derive(Debug, Clone)]
pub struct Driver {
    policy: StoppingPolicy,
    gradient_source: GradientSource,
}

impl Driver {
    pub fn new(policy: StoppingPolicy) -> Self {
        Self {
            policy,
            gradient_source: GradientSource::Auto,
        }
    }

    pub fn with_gradient_source(mut self, gradient_source: GradientSource) -> Self {
        self.gradient_source = gradient_source;
        self
    }

    pub fn policy(&self) -> &StoppingPolicy {
        &self.policy
    }

    /// Minimizes `objective` from `initial` using full gradients.
    ///
    /// # Errors
    ///
    /// - [`Error::DimensionMismatch`] if `initial` does not match the
    ///   objective's dimension, or a gradient has the wrong length
    /// - [`Error::InvalidConfig`] for a malformed stopping policy
    /// - [`Error::InvalidStepSize`] for a bad numeric-gradient step
    ///
    /// Divergence is not an error; see [`RunOutcome::Diverged`].
    pub fn minimize<O>(&self, objective: &O, initial: &[f64], rule: &dyn UpdateRule) -> Result<Run>
    where
        O: Objective + ?Sized,
    {
        check_dimension("initial point", objective.dimension(), initial.len())?;
        let source = self.gradient_source;
        let mut gradient_at = |x: &[f64]| -> Result<Vec<f64>> {
            let step = match source {
                GradientSource::Auto => match objective.gradient(x) {
                    Some(g) => return Ok(g),
                    None => DEFAULT_STEP,
                },
                GradientSource::Numeric { step } => step,
            };
            numeric_gradient(|p: &[f64]| objective.loss(p), x, step)
        };
        self.run(|x: &[f64]| objective.loss(x), initial, rule, &mut gradient_at)
    }

    /// Minimizes a sample-averaged objective with batch, stochastic or
    /// mini-batch gradients.
    ///
    /// Each step's gradient averages over the next batch drawn from a
    /// [`BatchSampler`]; the recorded losses are always over the full
    /// objective so curves from different batch sizes are comparable.
    ///
    /// # Errors
    ///
    /// As [`minimize`](Self::minimize), plus [`Error::InvalidBatchSize`] and
    /// [`Error::EmptyDataset`] from the batch configuration.
    pub fn minimize_stochastic<O, R>(
        &self,
        objective: &O,
        initial: &[f64],
        rule: &dyn UpdateRule,
        batch_size: BatchSize,
        rng: &mut R,
    ) -> Result<Run>
    where
        O: SampledObjective + ?Sized,
        R: Rng + ?Sized,
    {
        check_dimension("initial point", objective.dimension(), initial.len())?;
        let mut sampler = BatchSampler::new(objective.num_samples(), batch_size)?;
        log::debug!(
            "{} with {} batches of {} samples",
            rule.name(),
            batch_size.label(),
            sampler.batch_len()
        );

        let source = self.gradient_source;
        let mut gradient_at = |x: &[f64]| -> Result<Vec<f64>> {
            let indices = sampler.next_batch(&mut *rng);
            let step = match source {
                GradientSource::Auto => match objective.batch_gradient(x, indices) {
                    Some(g) => return Ok(g),
                    None => DEFAULT_STEP,
                },
                GradientSource::Numeric { step } => step,
            };
            numeric_gradient(|p: &[f64]| objective.batch_loss(p, indices), x, step)
        };
        self.run(|x: &[f64]| objective.loss(x), initial, rule, &mut gradient_at)
    }

    /// Runs every rule from the same starting point.
    pub fn compare<O>(
        &self,
        objective: &O,
        initial: &[f64],
        rules: &[Box<dyn UpdateRule>],
    ) -> Result<Vec<Run>>
    where
        O: Objective + ?Sized,
    {
        rules
            .iter()
            .map(|rule| self.minimize(objective, initial, rule.as_ref()))
            .collect()
    }

    fn run<L>(
        &self,
        loss: L,
        initial: &[f64],
        rule: &dyn UpdateRule,
        gradient_at: &mut dyn FnMut(&[f64]) -> Result<Vec<f64>>,
    ) -> Result<Run>
    where
        L: Fn(&[f64]) -> f64,
    {
        self.policy.validate()?;

        let mut trajectory = Trajectory::default();
        let mut current = initial.to_vec();
        let initial_loss = loss(&current);
        trajectory.push(current.clone(), initial_loss);

        if !initial_loss.is_finite() || !all_finite(&current) {
            log::warn!("{}: initial point is not finite (loss {})", rule.name(), initial_loss);
            return Ok(Run {
                optimizer: rule.name(),
                trajectory,
                outcome: RunOutcome::Diverged { iteration: 0 },
            });
        }

        let mut state = rule.init(current.len());
        let mut outcome = RunOutcome::MaxIterations;

        for iteration in 1..=self.policy.max_iterations {
            let mut finite_gradient = true;
            let (next, next_state) = {
                let mut checked = |point: &[f64]| -> Result<Vec<f64>> {
                    let g = gradient_at(point)?;
                    finite_gradient &= all_finite(&g);
                    Ok(g)
                };
                rule.step(state, &current, &mut checked)?
            };

            let next_loss = loss(&next);
            let step_length = distance(&next, &current);
            trajectory.push(next.clone(), next_loss);
            log::debug!(
                "{} iter {}: loss={:.6e} step={:.3e}",
                rule.name(),
                iteration,
                next_loss,
                step_length
            );

            if !finite_gradient || !all_finite(&next) || !next_loss.is_finite() {
                log::warn!(
                    "{} diverged at iteration {} (loss {})",
                    rule.name(),
                    iteration,
                    next_loss
                );
                outcome = RunOutcome::Diverged { iteration };
                break;
            }
            if self.policy.step_tolerance.map_or(false, |tol| step_length < tol) {
                outcome = RunOutcome::Converged {
                    iteration,
                    criterion: StopCriterion::StepSize,
                };
                break;
            }
            if self.policy.loss_tolerance.map_or(false, |tol| next_loss < tol) {
                outcome = RunOutcome::Converged {
                    iteration,
                    criterion: StopCriterion::Loss,
                };
                break;
            }

            current = next;
            state = next_state;
        }

        let run = Run {
            optimizer: rule.name(),
            trajectory,
            outcome,
        };
        log::info!(
            "{} finished after {} iterations: {:?}, loss {:.6e}",
            run.optimizer,
            run.iterations(),
            run.outcome,
            run.final_loss()
        );
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objectives::{FnObjective, Rosenbrock};
    use crate::optimizers::{Momentum, Vanilla};
    use std::cell::Cell;

    fn bowl() -> FnObjective<'static> {
        FnObjective::new(2, |x: &[f64]| x[0] * x[0] + x[1] * x[1])
            .with_gradient(|x: &[f64]| vec![2.0 * x[0], 2.0 * x[1]])
    }

    #[test]
    fn test_trajectory_length_is_iterations_plus_one() {
        let driver = Driver::new(StoppingPolicy::new(25));
        let rule = Vanilla::new(0.1).unwrap();
        let run = driver.minimize(&bowl(), &[1.0, -1.0], &rule).unwrap();
        assert_eq!(run.trajectory.len(), 26);
        assert_eq!(run.iterations(), 25);
        assert_eq!(run.outcome, RunOutcome::MaxIterations);
        assert_eq!(run.optimizer, "vanilla");
    }

    #[test]
    fn test_zero_iterations_records_initial_point() {
        let driver = Driver::new(StoppingPolicy::new(0));
        let rule = Vanilla::new(0.1).unwrap();
        let run = driver.minimize(&bowl(), &[3.0, 4.0], &rule).unwrap();
        assert_eq!(run.trajectory.len(), 1);
        assert_eq!(run.final_point(), &[3.0, 4.0]);
        assert_eq!(run.final_loss(), 25.0);
    }

    #[test]
    fn test_step_tolerance_stops_early() {
        let driver = Driver::new(StoppingPolicy::new(10_000).with_step_tolerance(1e-6));
        let rule = Vanilla::new(0.1).unwrap();
        let run = driver.minimize(&bowl(), &[1.0, 1.0], &rule).unwrap();
        match run.outcome {
            RunOutcome::Converged {
                iteration,
                criterion: StopCriterion::StepSize,
            } => {
                assert!(iteration < 10_000);
                assert_eq!(run.trajectory.len(), iteration + 1);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_loss_tolerance_stops_early() {
        let driver = Driver::new(StoppingPolicy::new(10_000).with_loss_tolerance(1e-4));
        let rule = Vanilla::new(0.1).unwrap();
        let run = driver.minimize(&bowl(), &[1.0, 1.0], &rule).unwrap();
        assert!(matches!(
            run.outcome,
            RunOutcome::Converged {
                criterion: StopCriterion::Loss,
                ..
            }
        ));
        assert!(run.final_loss() < 1e-4);
        // The previous point was still above the tolerance.
        let previous = run.trajectory.get(run.trajectory.len() - 2).unwrap();
        assert!(previous.loss >= 1e-4);
    }

    #[test]
    fn test_numeric_fallback_without_closed_form() {
        let plain = FnObjective::new(2, |x: &[f64]| x[0] * x[0] + x[1] * x[1]);
        let driver = Driver::new(StoppingPolicy::new(20));
        let rule = Vanilla::new(0.1).unwrap();

        let numeric = driver.minimize(&plain, &[1.0, -2.0], &rule).unwrap();
        let exact = driver.minimize(&bowl(), &[1.0, -2.0], &rule).unwrap();
        for (a, b) in numeric.trajectory.iter().zip(exact.trajectory.iter()) {
            assert!((a.params[0] - b.params[0]).abs() < 1e-9);
            assert!((a.params[1] - b.params[1]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_forced_numeric_gradient_on_rosenbrock() {
        let driver = Driver::new(StoppingPolicy::new(50))
            .with_gradient_source(GradientSource::Numeric { step: 1e-5 });
        let exact_driver = Driver::new(StoppingPolicy::new(50));
        let rule = Momentum::new(0.0005, 0.9).unwrap();

        let numeric = driver.minimize(&Rosenbrock::default(), &[-1.0, 1.5], &rule).unwrap();
        let exact = exact_driver
            .minimize(&Rosenbrock::default(), &[-1.0, 1.5], &rule)
            .unwrap();
        assert!(distance(numeric.final_point(), exact.final_point()) < 1e-5);
    }

    #[test]
    fn test_forced_numeric_skips_closed_form() {
        let closed_form_calls = Cell::new(0usize);
        let counted = FnObjective::new(2, |x: &[f64]| x[0] * x[0] + x[1] * x[1]).with_gradient(
            |x: &[f64]| {
                closed_form_calls.set(closed_form_calls.get() + 1);
                vec![2.0 * x[0], 2.0 * x[1]]
            },
        );
        let rule = Vanilla::new(0.1).unwrap();

        Driver::new(StoppingPolicy::new(10))
            .with_gradient_source(GradientSource::Numeric { step: 1e-4 })
            .minimize(&counted, &[1.0, -1.0], &rule)
            .unwrap();
        assert_eq!(closed_form_calls.get(), 0);

        Driver::new(StoppingPolicy::new(10))
            .minimize(&counted, &[1.0, -1.0], &rule)
            .unwrap();
        assert_eq!(closed_form_calls.get(), 10);
    }

    #[test]
    fn test_initial_dimension_checked() {
        let driver = Driver::new(StoppingPolicy::new(5));
        let rule = Vanilla::new(0.1).unwrap();
        let result = driver.minimize(&Rosenbrock::default(), &[1.0, 2.0, 3.0], &rule);
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch { expected: 2, found: 3, .. })
        ));
    }

    #[test]
    fn test_wrong_gradient_length_is_fatal() {
        let broken =
            FnObjective::new(2, |x: &[f64]| x[0] + x[1]).with_gradient(|_: &[f64]| vec![1.0]);
        let driver = Driver::new(StoppingPolicy::new(5));
        let rule = Vanilla::new(0.1).unwrap();
        assert!(matches!(
            driver.minimize(&broken, &[0.0, 0.0], &rule),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_bad_tolerance_rejected() {
        let driver = Driver::new(StoppingPolicy::new(5).with_step_tolerance(0.0));
        let rule = Vanilla::new(0.1).unwrap();
        assert!(matches!(
            driver.minimize(&bowl(), &[0.0, 0.0], &rule),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bad_numeric_step_rejected() {
        let driver = Driver::new(StoppingPolicy::new(5))
            .with_gradient_source(GradientSource::Numeric { step: -1.0 });
        let rule = Vanilla::new(0.1).unwrap();
        assert!(matches!(
            driver.minimize(&bowl(), &[1.0, 1.0], &rule),
            Err(Error::InvalidStepSize(_))
        ));
    }

    #[test]
    fn test_overflow_is_reported_as_divergence() {
        // Learning rate far too large for this bowl: |x| grows ×999 per step.
        let steep = FnObjective::new(1, |x: &[f64]| 1000.0 * x[0] * x[0])
            .with_gradient(|x: &[f64]| vec![2000.0 * x[0]]);
        let driver = Driver::new(StoppingPolicy::new(10_000));
        let rule = Vanilla::new(0.5).unwrap();
        let run = driver.minimize(&steep, &[1.0], &rule).unwrap();

        assert!(run.is_diverged());
        assert!(!run.final_loss().is_finite());
        // Every point before the last is finite.
        let n = run.trajectory.len();
        assert!(run.trajectory.points()[..n - 1].iter().all(|p| p.loss.is_finite()));
        assert!(n < 10_001);
    }

    #[test]
    fn test_compare_runs_each_rule() {
        let driver = Driver::new(StoppingPolicy::new(10));
        let rules: Vec<Box<dyn UpdateRule>> = vec![
            Box::new(Vanilla::new(0.1).unwrap()),
            Box::new(Momentum::new(0.1, 0.5).unwrap()),
        ];
        let runs = driver.compare(&bowl(), &[1.0, 1.0], &rules).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].optimizer, "vanilla");
        assert_eq!(runs[1].optimizer, "momentum");
        assert!(runs.iter().all(|r| r.trajectory.len() == 11));
    }

    #[test]
    fn test_trajectory_iteration() {
        let driver = Driver::new(StoppingPolicy::new(3));
        let rule = Vanilla::new(0.25).unwrap();
        let run = driver.minimize(&bowl(), &[2.0, 0.0], &rule).unwrap();

        // x halves each step: 2, 1, 0.5, 0.25
        let xs: Vec<f64> = (&run.trajectory).into_iter().map(|p| p.params[0]).collect();
        assert_eq!(xs, vec![2.0, 1.0, 0.5, 0.25]);
        let losses: Vec<f64> = run.trajectory.losses().collect();
        assert_eq!(losses, vec![4.0, 1.0, 0.25, 0.0625]);
    }
}
