//! Policy gradient ascent on a linear system
//!
//! Drives a Gaussian linear policy on `s' = 0.9 s + a` with reward `-s'^2`
//! and prints the final report as JSON. The ascent configuration can be read
//! from a JSON file; missing fields keep their defaults.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example ascent_linear --release
//! cargo run --example ascent_linear --release -- config.json
//! RUST_LOG=debug cargo run --example ascent_linear
//! ```
//!
//! A config file might look like
//!
//! ```json
//! { "estimator": "gpomdp", "rate": 0.01, "max_it": 200,
//!   "estimator_config": { "lam": 0.95, "max_it": 500 } }
//! ```

use anyhow::{Context, Result};
use thrust_pg::prelude::*;
use tracing_subscriber::EnvFilter;

const HORIZON: usize = 10;
const NOISE_STD: f64 = 0.1;
const SEED: u64 = 42;

fn load_config() -> Result<AscentConfig> {
    let Some(path) = std::env::args().nth(1) else {
        let bounds =
            BoundsConfig { lower: vec![-1.0, -1.0], upper: vec![0.0, 1.0], seed: Some(SEED) };
        return Ok(AscentConfig::new()
            .estimator(EstimatorKind::Gpomdp)
            .rate(0.01)
            .eps(0.01)
            .max_it(200)
            .lam(0.95)
            .bounds(bounds));
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config = serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = load_config()?;
    tracing::info!("Estimator: {}", config.estimator);
    tracing::info!("  Step size: {}", config.rate);
    tracing::info!("  Tolerance: {}", config.eps);
    tracing::info!("  Max iterations: {}", config.max_it);

    let system = LinearSystem::scalar(0.9, 1.0, 1.0).with_initial_noise(0.05, SEED)?;
    let mut env = Episodic::new(system, HORIZON)?;
    let mut policy = LinearPolicy::gaussian(1, NOISE_STD, SEED)?;

    let mut pg = PolicyGradient::new(config)?;
    let report = pg.optimize(&mut policy, &mut env)?;

    tracing::info!(
        iterations = report.iterations,
        converged = report.converged,
        rollouts = report.total_rollouts,
        "ascent finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
