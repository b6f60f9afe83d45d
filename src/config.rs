//! Run configuration
//!
//! A [`RunConfig`] describes one optimization run (objective, update rule,
//! stopping policy, batch size and seed) and is read from JSON files such as
//! the ones under `config/`.
//!
//! # Example
//!
//! ```json
//! {
//!   "optimizer": "adam",
//!   "objective": { "type": "rosenbrock", "a": 1.0, "b": 100.0 },
//!   "hyperparameters": { "learning_rate": 0.01 },
//!   "initial_point": [2.0, -1.0],
//!   "max_iterations": 1000,
//!   "step_tolerance": 1e-9
//! }
//! ```
//!
//! Logistic objectives are fitted to a synthetic dataset drawn from
//! `true_weights` with the configured seed:
//!
//! ```json
//! {
//!   "optimizer": "momentum",
//!   "objective": { "type": "logistic", "samples": 200, "true_weights": [-0.5, 2.0, -1.0] },
//!   "batch_size": { "mini": 16 }
//! }
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::driver::{Driver, GradientSource, Run, StoppingPolicy};
use crate::error::{Error, Result};
use crate::objectives::{InMemoryDataset, LogisticRegression, Rosenbrock};
use crate::optimizers::{Hyperparameters, OptimizerKind, UpdateRule};
use crate::utils::numeric::DEFAULT_STEP;
use crate::utils::sampler::BatchSize;

/// Objective section of a [`RunConfig`], tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectiveConfig {
    Rosenbrock {
        #[serde(default = "default_rosenbrock_a")]
        a: f64,
        #[serde(default = "default_rosenbrock_b")]
        b: f64,
    },
    Logistic {
        #[serde(default = "default_samples")]
        samples: usize,
        /// Weights of the model the labels are drawn from, intercept first.
        true_weights: Vec<f64>,
    },
}

impl ObjectiveConfig {
    /// Number of parameters being optimized.
    pub fn dimension(&self) -> usize {
        match self {
            ObjectiveConfig::Rosenbrock { .. } => 2,
            ObjectiveConfig::Logistic { true_weights, .. } => true_weights.len(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ObjectiveConfig::Rosenbrock { .. } => "rosenbrock",
            ObjectiveConfig::Logistic { .. } => "logistic",
        }
    }
}

/// Configuration of a single optimization run.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub optimizer: OptimizerKind,

    pub objective: ObjectiveConfig,

    #[serde(default)]
    pub hyperparameters: Hyperparameters,

    /// Starting point; the origin when omitted.
    pub initial_point: Option<Vec<f64>>,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    pub step_tolerance: Option<f64>,

    pub loss_tolerance: Option<f64>,

    /// Only logistic objectives accept anything other than `"full"`.
    #[serde(default = "default_batch_size")]
    pub batch_size: BatchSize,

    /// Use central differences even when a closed-form gradient exists.
    #[serde(default)]
    pub numeric_gradient: bool,

    #[serde(default = "default_numeric_step")]
    pub numeric_step: f64,

    /// Seeds dataset generation and batch shuffling.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_rosenbrock_a() -> f64 {
    1.0
}

fn default_rosenbrock_b() -> f64 {
    100.0
}

fn default_samples() -> usize {
    200
}

fn default_max_iterations() -> usize {
    1000
}

fn default_batch_size() -> BatchSize {
    BatchSize::Full
}

fn default_numeric_step() -> f64 {
    DEFAULT_STEP
}

fn default_seed() -> u64 {
    42
}

impl RunConfig {
    pub fn stopping_policy(&self) -> StoppingPolicy {
        StoppingPolicy {
            max_iterations: self.max_iterations,
            step_tolerance: self.step_tolerance,
            loss_tolerance: self.loss_tolerance,
        }
    }

    pub fn gradient_source(&self) -> GradientSource {
        if self.numeric_gradient {
            GradientSource::Numeric {
                step: self.numeric_step,
            }
        } else {
            GradientSource::Auto
        }
    }

    pub fn driver(&self) -> Driver {
        Driver::new(self.stopping_policy()).with_gradient_source(self.gradient_source())
    }

    pub fn build_optimizer(&self) -> Result<Box<dyn UpdateRule>> {
        self.optimizer.build(self.hyperparameters)
    }

    /// The configured starting point, or the origin.
    pub fn initial_point(&self) -> Vec<f64> {
        self.initial_point
            .clone()
            .unwrap_or_else(|| vec![0.0; self.objective.dimension()])
    }

    /// Short description like `adam on rosenbrock (batch)`.
    pub fn label(&self) -> String {
        format!(
            "{} on {} ({})",
            self.optimizer,
            self.objective.name(),
            self.batch_size.label()
        )
    }

    /// Builds the objective and update rule and performs the run.
    pub fn execute(&self) -> Result<Run> {
        let rule = self.build_optimizer()?;
        let driver = self.driver();
        let initial = self.initial_point();
        let mut rng = StdRng::seed_from_u64(self.seed);

        match &self.objective {
            ObjectiveConfig::Rosenbrock { a, b } => {
                driver.minimize(&Rosenbrock::new(*a, *b), &initial, rule.as_ref())
            }
            ObjectiveConfig::Logistic {
                samples,
                true_weights,
            } => {
                let dataset = InMemoryDataset::synthetic(true_weights, *samples, &mut rng)?;
                let objective = LogisticRegression::new(dataset)?;
                driver.minimize_stochastic(
                    &objective,
                    &initial,
                    rule.as_ref(),
                    self.batch_size,
                    &mut rng,
                )
            }
        }
    }
}

/// Loads and validates a run configuration from a JSON file.
///
/// # Errors
///
/// - [`Error::Io`] if the file cannot be read
/// - [`Error::Json`] if it is not a valid run configuration
/// - [`Error::InvalidConfig`] or [`Error::InvalidHyperparameter`] if a value
///   is out of range
///
/// # Example
///
/// ```no_run
/// use rust_gradient_descent::config::load_config;
///
/// let cfg = load_config("config/rosenbrock_adam.json").unwrap();
/// let run = cfg.execute().unwrap();
/// println!("{:?} after {} iterations", run.outcome, run.iterations());
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses and validates a run configuration from a JSON string.
pub fn parse_config(contents: &str) -> Result<RunConfig> {
    let config: RunConfig = serde_json::from_str(contents)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &RunConfig) -> Result<()> {
    config.stopping_policy().validate()?;
    config.build_optimizer()?;

    if !(config.numeric_step.is_finite() && config.numeric_step > 0.0) {
        return Err(Error::InvalidConfig(format!(
            "numeric_step must be finite and > 0, got {}",
            config.numeric_step
        )));
    }

    if let Some(ref point) = config.initial_point {
        if point.len() != config.objective.dimension() {
            return Err(Error::InvalidConfig(format!(
                "initial_point has {} components, {} objective needs {}",
                point.len(),
                config.objective.name(),
                config.objective.dimension()
            )));
        }
    }

    match &config.objective {
        ObjectiveConfig::Rosenbrock { .. } => {
            if config.batch_size != BatchSize::Full {
                return Err(Error::InvalidConfig(format!(
                    "batch_size {} needs a sample-based objective, \
                     rosenbrock only supports \"full\"",
                    config.batch_size.label()
                )));
            }
        }
        ObjectiveConfig::Logistic {
            samples,
            true_weights,
        } => {
            if true_weights.is_empty() {
                return Err(Error::InvalidConfig(
                    "true_weights must not be empty".to_string(),
                ));
            }
            config
                .batch_size
                .resolve(*samples)
                .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        }
    }

    Ok(())
}
