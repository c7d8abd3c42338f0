//! Gradient ascent configuration
//!
//! This module defines the configuration of the ascent driver, including the
//! estimator it drives, and provides validation and builder methods.

use serde::{Deserialize, Serialize};

use crate::error::{GradientError, Result};
use crate::estimate::{EstimatorConfig, EstimatorKind};
use crate::optimize::space::BoundsConfig;

/// Ascent configuration parameters
///
/// Every field has a default, so a JSON file only needs to name the values
/// it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AscentConfig {
    /// Which registered estimator to use
    pub estimator: EstimatorKind,

    /// Maximum number of ascent iterations
    pub max_it: usize,

    /// Ascent stops once the gradient norm drops below this
    pub eps: f64,

    /// Step size applied to each gradient
    pub rate: f64,

    /// Candidates sampled during initialization before giving up
    pub max_init_attempts: usize,

    /// Settings of the estimator itself
    pub estimator_config: EstimatorConfig,

    /// Initialization bounds, unit box `[0, 1]^D` when absent
    pub bounds: Option<BoundsConfig>,
}

impl Default for AscentConfig {
    fn default() -> Self {
        Self {
            estimator: EstimatorKind::Reinforce,
            max_it: 1000,
            eps: 0.0001,
            rate: 1.0,
            max_init_attempts: 1000,
            estimator_config: EstimatorConfig::default(),
            bounds: None,
        }
    }
}

impl AscentConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration parameters, including the estimator's
    pub fn validate(&self) -> Result<()> {
        if self.max_it == 0 {
            return Err(invalid("max_it must be positive"));
        }
        if !(self.eps.is_finite() && self.eps >= 0.0) {
            return Err(invalid("eps must be non-negative"));
        }
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(invalid("rate must be positive"));
        }
        if self.max_init_attempts == 0 {
            return Err(invalid("max_init_attempts must be positive"));
        }
        if let Some(bounds) = &self.bounds
            && bounds.lower.len() != bounds.upper.len()
        {
            return Err(GradientError::DimensionMismatch {
                expected: bounds.lower.len(),
                actual: bounds.upper.len(),
            });
        }
        self.estimator_config.validate()
    }

    /// Set the estimator
    pub fn estimator(mut self, kind: EstimatorKind) -> Self {
        self.estimator = kind;
        self
    }

    /// Set maximum ascent iterations
    pub fn max_it(mut self, max_it: usize) -> Self {
        self.max_it = max_it;
        self
    }

    /// Set ascent tolerance
    pub fn eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Set step size
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    /// Set the initialization budget
    pub fn max_init_attempts(mut self, attempts: usize) -> Self {
        self.max_init_attempts = attempts;
        self
    }

    /// Replace the estimator settings
    pub fn estimator_config(mut self, config: EstimatorConfig) -> Self {
        self.estimator_config = config;
        self
    }

    /// Set the estimator tolerance
    pub fn est_eps(mut self, eps: f64) -> Self {
        self.estimator_config.eps = eps;
        self
    }

    /// Set the finite-difference perturbation size
    pub fn var(mut self, var: f64) -> Self {
        self.estimator_config.var = var;
        self
    }

    /// Set the likelihood-ratio discount factor
    pub fn lam(mut self, lam: f64) -> Self {
        self.estimator_config.lam = lam;
        self
    }

    /// Set initialization bounds
    pub fn bounds(mut self, bounds: BoundsConfig) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

fn invalid(msg: &str) -> GradientError {
    GradientError::InvalidConfig(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AscentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.estimator, EstimatorKind::Reinforce);
        assert_eq!(config.rate, 1.0);
        assert_eq!(config.eps, 0.0001);
        assert_eq!(config.estimator_config.eps, 0.001);
    }

    #[test]
    fn test_config_validation() {
        assert!(AscentConfig::new().max_it(0).validate().is_err());
        assert!(AscentConfig::new().rate(0.0).validate().is_err());
        assert!(AscentConfig::new().eps(-1.0).validate().is_err());
        assert!(AscentConfig::new().max_init_attempts(0).validate().is_err());

        // Estimator settings are validated too
        assert!(AscentConfig::new().lam(0.0).validate().is_err());
        assert!(AscentConfig::new().var(-0.5).validate().is_err());

        let bounds = BoundsConfig { lower: vec![0.0], upper: vec![1.0, 2.0], seed: None };
        assert!(AscentConfig::new().bounds(bounds).validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = AscentConfig::new()
            .estimator(EstimatorKind::CentralFd)
            .rate(0.1)
            .var(0.01)
            .est_eps(1e-5);

        assert_eq!(config.estimator, EstimatorKind::CentralFd);
        assert_eq!(config.rate, 0.1);
        assert_eq!(config.estimator_config.var, 0.01);
        assert_eq!(config.estimator_config.eps, 1e-5);

        // Other values should remain default
        assert_eq!(config.max_it, 1000);
        assert_eq!(config.estimator_config.lam, 0.5);
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "estimator": "gpomdp",
            "rate": 0.05,
            "estimator_config": { "lam": 1.0, "max_it": 50 },
            "bounds": { "lower": [-1.0, -1.0], "upper": [1.0, 1.0], "seed": 4 }
        }"#;
        let config: AscentConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.estimator, EstimatorKind::Gpomdp);
        assert_eq!(config.estimator_config.max_it, 50);
        assert_eq!(config.estimator_config.var, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_estimator_in_json() {
        let json = r#"{ "estimator": "bogus_fd" }"#;
        assert!(serde_json::from_str::<AscentConfig>(json).is_err());
    }
}
