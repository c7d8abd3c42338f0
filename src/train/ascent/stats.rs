//! Ascent statistics
//!
//! Per-iteration records and their aggregate, used for logging and for the
//! final [`AscentReport`].

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::utils::RunningMeanStd;

/// Statistics for one ascent iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationStats {
    /// Iteration index, starting at 0
    pub iteration: usize,

    /// Norm of the gradient estimate
    pub gradient_norm: f64,

    /// Rollouts consumed by the estimate
    pub rollouts: usize,

    /// Whether the estimator met its own tolerance
    pub estimate_converged: bool,

    /// Mean reward per step of the estimate's trace
    pub mean_reward: Option<f64>,
}

/// Aggregated statistics across ascent iterations
#[derive(Debug, Clone, Default)]
pub struct AscentStats {
    /// Every iteration so far, in order
    pub history: Vec<IterationStats>,

    /// Running mean and variance of the gradient estimates
    pub gradients: Option<RunningMeanStd>,

    /// Rollouts consumed by initialization and ascent
    pub total_rollouts: usize,

    /// Estimates that ran out of rollouts before converging
    pub unconverged_estimates: usize,

    /// Best mean reward observed
    pub best_mean_reward: Option<f64>,
}

impl AscentStats {
    /// Create empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Count rollouts spent outside of ascent iterations
    pub fn add_rollouts(&mut self, rollouts: usize) {
        self.total_rollouts += rollouts;
    }

    /// Record an iteration and the gradient it produced
    pub fn update(&mut self, stats: IterationStats, gradient: &DVector<f64>) {
        self.total_rollouts += stats.rollouts;
        if !stats.estimate_converged {
            self.unconverged_estimates += 1;
        }
        if let Some(reward) = stats.mean_reward
            && self.best_mean_reward.is_none_or(|best| reward > best)
        {
            self.best_mean_reward = Some(reward);
        }

        self.gradients.get_or_insert_with(|| RunningMeanStd::new(gradient.len())).push(gradient);
        self.history.push(stats);
    }

    /// Number of recorded iterations
    pub fn iterations(&self) -> usize {
        self.history.len()
    }

    /// Gradient norm of the most recent iteration
    pub fn last_gradient_norm(&self) -> Option<f64> {
        self.history.last().map(|s| s.gradient_norm)
    }

    /// Gradient norms in iteration order
    pub fn gradient_norms(&self) -> Vec<f64> {
        self.history.iter().map(|s| s.gradient_norm).collect()
    }
}

/// Outcome of a full ascent run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AscentReport {
    /// Estimator used
    pub estimator: String,

    /// Final parameter
    pub parameter: Vec<f64>,

    /// Ascent iterations performed
    pub iterations: usize,

    /// Whether the gradient norm fell below the tolerance
    pub converged: bool,

    /// Gradient norm of the last iteration
    pub final_gradient_norm: f64,

    /// Rollouts consumed including initialization
    pub total_rollouts: usize,

    /// Estimates that ran out of rollouts before converging
    pub unconverged_estimates: usize,

    /// Best mean reward observed
    pub best_mean_reward: Option<f64>,

    /// Gradient norm per iteration
    pub gradient_norms: Vec<f64>,
}
