use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_gradient_descent::config::{load_config, RunConfig};
use rust_gradient_descent::driver::{Driver, Run, RunOutcome, StoppingPolicy, Trajectory};
use rust_gradient_descent::objectives::{InMemoryDataset, LogisticRegression, Rosenbrock};
use rust_gradient_descent::optimizers::{Hyperparameters, OptimizerKind};
use rust_gradient_descent::utils::BatchSize;
use rust_gradient_descent::Result;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

// Trajectories are written here as CSV, one file per run.
const LOG_DIR: &str = "./logs";
// Rosenbrock comparison.
const ROSENBROCK_START: [f64; 2] = [2.0, -1.0];
const ROSENBROCK_ITERATIONS: usize = 5000;
// Logistic regression comparison on synthetic data (intercept first).
const LOGISTIC_TRUE_WEIGHTS: [f64; 3] = [-0.5, 2.0, -1.0];
const LOGISTIC_SAMPLES: usize = 500;
const LOGISTIC_ITERATIONS: usize = 500;
const MINI_BATCH: usize = 32;
const SEED: u64 = 42;

// Per-rule learning rates that keep every rule stable from ROSENBROCK_START.
fn rosenbrock_learning_rate(kind: OptimizerKind) -> f64 {
    match kind {
        OptimizerKind::Vanilla => 1e-3,
        OptimizerKind::Momentum | OptimizerKind::Nesterov => 2e-4,
        OptimizerKind::Adagrad => 0.5,
        OptimizerKind::Rmsprop => 3e-3,
        OptimizerKind::Adam => 2e-2,
    }
}

/// Installs a stderr backend for the library's `log` records.
///
/// Warnings (divergence, samples dropped by a mini-batch size) are shown by
/// default; set `RUST_LOG=debug` to trace every iteration.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Fails only when a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Loads the run configuration named by the first argument, if any.
fn config_from_args(args: &[String]) -> Result<Option<RunConfig>> {
    args.get(1).map(load_config).transpose()
}

/// Runs every update rule on Rosenbrock from the same starting point.
fn compare_rosenbrock() -> Result<Vec<(String, Run)>> {
    let objective = Rosenbrock::default();
    let driver = Driver::new(StoppingPolicy::new(ROSENBROCK_ITERATIONS).with_step_tolerance(1e-12));

    OptimizerKind::ALL
        .iter()
        .map(|&kind| -> Result<(String, Run)> {
            let hyperparameters =
                Hyperparameters::with_learning_rate(rosenbrock_learning_rate(kind));
            let rule = kind.build(hyperparameters)?;
            let run = driver.minimize(&objective, &ROSENBROCK_START, rule.as_ref())?;
            Ok((format!("rosenbrock_{}", kind), run))
        })
        .collect()
}

/// Batch, stochastic, mini-batch and adaptive runs on one synthetic dataset.
fn compare_logistic() -> Result<Vec<(String, Run)>> {
    let mut rng = StdRng::seed_from_u64(SEED);
    let dataset = InMemoryDataset::synthetic(&LOGISTIC_TRUE_WEIGHTS, LOGISTIC_SAMPLES, &mut rng)?;
    let objective = LogisticRegression::new(dataset)?;
    let driver = Driver::new(StoppingPolicy::new(LOGISTIC_ITERATIONS));
    let initial = vec![0.0; LOGISTIC_TRUE_WEIGHTS.len()];

    let variants = [
        (OptimizerKind::Vanilla, BatchSize::Full, 0.5),
        (OptimizerKind::Vanilla, BatchSize::Single, 0.05),
        (OptimizerKind::Vanilla, BatchSize::Mini(MINI_BATCH), 0.2),
        (OptimizerKind::Momentum, BatchSize::Mini(MINI_BATCH), 0.05),
        (OptimizerKind::Adagrad, BatchSize::Mini(MINI_BATCH), 0.5),
        (OptimizerKind::Rmsprop, BatchSize::Mini(MINI_BATCH), 0.01),
        (OptimizerKind::Adam, BatchSize::Mini(MINI_BATCH), 0.05),
    ];

    let mut runs = Vec::with_capacity(variants.len());
    for (kind, batch_size, learning_rate) in variants {
        let rule = kind.build(Hyperparameters::with_learning_rate(learning_rate))?;
        // Same batch order for every variant.
        let mut batch_rng = StdRng::seed_from_u64(SEED);
        let run = driver.minimize_stochastic(
            &objective,
            &initial,
            rule.as_ref(),
            batch_size,
            &mut batch_rng,
        )?;
        let name = format!("logistic_{}_{}", kind, batch_size.label());
        println!(
            "  {:<36} accuracy {:>6.2}%",
            name,
            objective.accuracy(run.final_point()) * 100.0
        );
        runs.push((name, run));
    }
    Ok(runs)
}

fn describe(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Converged { iteration, criterion } => {
            format!("converged@{} ({:?})", iteration, criterion)
        }
        RunOutcome::MaxIterations => "max-iterations".to_string(),
        RunOutcome::Diverged { iteration } => format!("diverged@{}", iteration),
    }
}

fn print_summary(title: &str, runs: &[(String, Run)]) {
    println!("\n=== {} ===", title);
    println!(
        "{:<36} {:<24} {:>8} {:>14}  final point",
        "run", "outcome", "iters", "final loss"
    );
    for (name, run) in runs {
        let point: Vec<String> = run.final_point().iter().map(|v| format!("{:.4}", v)).collect();
        println!(
            "{:<36} {:<24} {:>8} {:>14.6e}  [{}]",
            name,
            describe(&run.outcome),
            run.iterations(),
            run.final_loss(),
            point.join(", ")
        );
    }
}

// Keeps letters, digits and underscores so labels become safe file names.
fn file_name(label: &str) -> String {
    let mut name: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    while name.contains("__") {
        name = name.replace("__", "_");
    }
    format!("{}.csv", name.trim_matches('_'))
}

/// Writes `iteration,loss,x0,x1,...` rows for an external plotter.
fn write_trajectory(path: &Path, trajectory: &Trajectory) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    let width = trajectory.first().map_or(0, |p| p.params.len());
    let header: Vec<String> = (0..width).map(|i| format!("x{}", i)).collect();
    writeln!(out, "iteration,loss,{}", header.join(","))?;
    for (iteration, point) in trajectory.iter().enumerate() {
        let values: Vec<String> = point.params.iter().map(|v| v.to_string()).collect();
        writeln!(out, "{},{},{}", iteration, point.loss, values.join(","))?;
    }
    out.flush()?;
    Ok(())
}

fn write_all(dir: &Path, runs: &[(String, Run)]) -> Result<()> {
    fs::create_dir_all(dir)?;
    for (name, run) in runs {
        write_trajectory(&dir.join(file_name(name)), &run.trajectory)?;
    }
    Ok(())
}

fn run_configured(config: &RunConfig) -> Result<Vec<(String, Run)>> {
    println!("Running {}...", config.label());
    let run = config.execute()?;
    Ok(vec![(config.label(), run)])
}

fn run_comparison() -> Result<(Vec<(String, Run)>, Vec<(String, Run)>)> {
    println!("Comparing update rules on Rosenbrock from {:?}...", ROSENBROCK_START);
    let rosenbrock = compare_rosenbrock()?;

    println!(
        "Comparing batch sizes on logistic regression ({} samples)...",
        LOGISTIC_SAMPLES
    );
    let logistic = compare_logistic()?;
    Ok((rosenbrock, logistic))
}

fn main() {
    init_logging();
    let program_start = Instant::now();
    let args: Vec<String> = std::env::args().collect();

    let result = config_from_args(&args).and_then(|config| match config {
        Some(config) => {
            let runs = run_configured(&config)?;
            print_summary("Configured run", &runs);
            write_all(Path::new(LOG_DIR), &runs)
        }
        None => {
            let (rosenbrock, logistic) = run_comparison()?;
            print_summary("Rosenbrock", &rosenbrock);
            print_summary("Logistic regression", &logistic);
            write_all(Path::new(LOG_DIR), &rosenbrock)?;
            write_all(Path::new(LOG_DIR), &logistic)
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    println!("\nTrajectories written to {}", LOG_DIR);
    println!(
        "Total program time: {:.2} seconds",
        program_start.elapsed().as_secs_f64()
    );
}
