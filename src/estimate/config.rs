//! Estimator configuration
//!
//! One configuration struct covers all four estimators; each estimator reads
//! the knobs it needs (`var` for finite differences, `lam` and `baseline` for
//! the likelihood-ratio estimators, `max_it` and `eps` for the latter's
//! rollout loop).

use serde::{Deserialize, Serialize};

use crate::error::{GradientError, Result};

/// Gradient estimator configuration
///
/// Defaults follow common settings for small benchmark systems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Maximum rollouts per estimate (likelihood-ratio estimators)
    pub max_it: usize,

    /// Convergence tolerance of the estimate itself
    pub eps: f64,

    /// Perturbation size for finite differences
    pub var: f64,

    /// Discount factor in (0, 1]
    pub lam: f64,

    /// Subtract the variance-minimizing baseline (likelihood-ratio estimators)
    pub baseline: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self { max_it: 200, eps: 0.001, var: 0.5, lam: 0.5, baseline: true }
    }
}

impl EstimatorConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_it == 0 {
            return Err(invalid("max_it must be positive"));
        }
        if !(self.eps.is_finite() && self.eps >= 0.0) {
            return Err(invalid("eps must be non-negative"));
        }
        if !(self.var.is_finite() && self.var > 0.0) {
            return Err(invalid("var must be positive"));
        }
        if !(self.lam > 0.0 && self.lam <= 1.0) {
            return Err(invalid("lam must be in (0, 1]"));
        }
        Ok(())
    }

    /// Set maximum rollouts per estimate
    pub fn max_it(mut self, max_it: usize) -> Self {
        self.max_it = max_it;
        self
    }

    /// Set estimator tolerance
    pub fn eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Set finite-difference perturbation size
    pub fn var(mut self, var: f64) -> Self {
        self.var = var;
        self
    }

    /// Set discount factor
    pub fn lam(mut self, lam: f64) -> Self {
        self.lam = lam;
        self
    }

    /// Enable or disable the baseline
    pub fn baseline(mut self, baseline: bool) -> Self {
        self.baseline = baseline;
        self
    }
}

fn invalid(msg: &str) -> GradientError {
    GradientError::InvalidConfig(msg.to_string())
}
