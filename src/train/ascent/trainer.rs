//! Gradient ascent driver
//!
//! This module contains [`PolicyGradient`], which owns the parameter across
//! iterations and moves it along the estimated gradient.

use nalgebra::DVector;

use super::config::AscentConfig;
use super::stats::{AscentReport, AscentStats, IterationStats};
use crate::env::Rollout;
use crate::error::{GradientError, Result};
use crate::estimate::{Estimator, GradientEstimator};
use crate::optimize::{BoundedSpace, ParameterSpace};
use crate::policy::Policy;

/// Lifecycle of an ascent run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AscentState {
    /// No starting parameter chosen yet
    Uninitialized,
    /// Stepping along the gradient
    Ascending,
    /// Last gradient norm fell below the tolerance
    Converged,
}

/// Policy gradient ascent
///
/// Drives any [`GradientEstimator`]; the registered estimators are reached
/// through [`Estimator`].
#[derive(Debug)]
pub struct PolicyGradient<G = Estimator> {
    estimator: G,
    config: AscentConfig,
    space: Option<Box<dyn ParameterSpace>>,
    state: AscentState,
    parameter: Option<DVector<f64>>,
    stats: AscentStats,
}

impl PolicyGradient<Estimator> {
    /// Create a driver for the estimator named in `config`
    pub fn new(config: AscentConfig) -> Result<Self> {
        config.validate()?;
        let estimator = Estimator::new(config.estimator, &config.estimator_config)?;
        Self::with_estimator(estimator, config)
    }

    /// Create a driver for the estimator registered under `key`
    ///
    /// Unknown keys fail here, before any rollout happens.
    pub fn from_key(key: &str, config: AscentConfig) -> Result<Self> {
        Self::new(config.estimator(key.parse()?))
    }
}

impl<G: GradientEstimator> PolicyGradient<G> {
    /// Create a driver around a custom estimator
    ///
    /// `config.estimator` and `config.estimator_config` are ignored; the
    /// estimator brings its own settings.
    pub fn with_estimator(estimator: G, config: AscentConfig) -> Result<Self> {
        config.validate()?;
        let space: Option<Box<dyn ParameterSpace>> = match &config.bounds {
            Some(bounds) => Some(Box::new(BoundedSpace::from_config(bounds)?)),
            None => None,
        };
        Ok(Self {
            estimator,
            config,
            space,
            state: AscentState::Uninitialized,
            parameter: None,
            stats: AscentStats::new(),
        })
    }

    /// Sample starting parameters from `space` instead of the configured bounds
    pub fn with_parameter_space<S: ParameterSpace + 'static>(mut self, space: S) -> Self {
        self.space = Some(Box::new(space));
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &AscentConfig {
        &self.config
    }

    /// Get the estimator
    pub fn estimator(&self) -> &G {
        &self.estimator
    }

    /// Current lifecycle state
    pub fn state(&self) -> AscentState {
        self.state
    }

    /// Current parameter, once initialized
    pub fn parameter(&self) -> Option<&DVector<f64>> {
        self.parameter.as_ref()
    }

    /// Statistics collected so far
    pub fn stats(&self) -> &AscentStats {
        &self.stats
    }

    /// Whether the last gradient norm fell below the tolerance
    pub fn is_finished(&self) -> bool {
        self.state == AscentState::Converged
    }

    /// Forget the current parameter and statistics
    pub fn reset(&mut self) {
        self.state = AscentState::Uninitialized;
        self.parameter = None;
        self.stats = AscentStats::new();
    }

    /// Start ascent from the current parameter of `policy`, skipping sampling
    pub fn initialize_at<P: Policy>(&mut self, policy: &P) {
        self.parameter = Some(policy.parameter().clone());
        self.state = AscentState::Ascending;
    }

    /// Choose a starting parameter
    ///
    /// Candidates are sampled from the parameter space until one has a
    /// gradient norm of at least `eps`, which rejects flat starting points.
    pub fn initialize<R, P>(&mut self, policy: &mut P, env: &mut R) -> Result<()>
    where
        R: Rollout,
        P: Policy<State = R::State, Action = R::Action>,
    {
        let dim = policy.parameter_shape();
        // Default box is created per driver, never shared
        let space = self.space.get_or_insert_with(|| Box::new(BoundedSpace::unit(dim)));
        if space.dim() != dim {
            return Err(GradientError::DimensionMismatch { expected: dim, actual: space.dim() });
        }

        for attempt in 1..=self.config.max_init_attempts {
            let candidate = space.element();
            let estimate = self.estimator.estimate(policy, env, &candidate)?;
            self.stats.add_rollouts(estimate.rollouts);

            let norm = estimate.norm();
            if norm.is_finite() && norm >= self.config.eps {
                tracing::info!(attempt, norm, "initialized {} ascent", self.estimator.name());
                self.parameter = Some(candidate);
                self.state = AscentState::Ascending;
                return Ok(());
            }
            tracing::debug!(attempt, norm, "rejected flat starting parameter");
        }

        Err(GradientError::InitializationFailed {
            attempts: self.config.max_init_attempts,
            eps: self.config.eps,
        })
    }

    /// Perform one ascent iteration
    ///
    /// Estimates the gradient at the current parameter, moves the parameter
    /// by `rate * gradient` and writes it into the policy.
    pub fn step<R, P>(&mut self, policy: &mut P, env: &mut R) -> Result<IterationStats>
    where
        R: Rollout,
        P: Policy<State = R::State, Action = R::Action>,
    {
        let parameter = self.parameter.as_ref().ok_or(GradientError::NotInitialized)?;
        let estimate = self.estimator.estimate(policy, env, parameter)?;

        let next = parameter + &estimate.gradient * self.config.rate;
        policy.set_parameter(next.clone())?;
        self.parameter = Some(next);

        let stats = IterationStats {
            iteration: self.stats.iterations(),
            gradient_norm: estimate.norm(),
            rollouts: estimate.rollouts,
            estimate_converged: estimate.converged(),
            mean_reward: estimate.trace.mean_reward(),
        };
        self.stats.update(stats.clone(), &estimate.gradient);

        self.state = if stats.gradient_norm < self.config.eps {
            AscentState::Converged
        } else {
            AscentState::Ascending
        };

        tracing::debug!(
            iteration = stats.iteration,
            norm = stats.gradient_norm,
            rollouts = stats.rollouts,
            "ascent step"
        );
        Ok(stats)
    }

    /// Run ascent until convergence or `max_it` iterations
    ///
    /// Initializes first unless a starting parameter is already set. A run
    /// that has already converged is reported as is.
    pub fn optimize<R, P>(&mut self, policy: &mut P, env: &mut R) -> Result<AscentReport>
    where
        R: Rollout,
        P: Policy<State = R::State, Action = R::Action>,
    {
        if self.is_finished() {
            return Ok(self.report());
        }
        if self.state == AscentState::Uninitialized {
            self.initialize(policy, env)?;
        }

        for _ in 0..self.config.max_it {
            self.step(policy, env)?;
            if self.is_finished() {
                break;
            }
        }

        let report = self.report();
        if report.converged {
            tracing::info!(
                iterations = report.iterations,
                norm = report.final_gradient_norm,
                "ascent converged"
            );
        } else {
            tracing::warn!(
                iterations = report.iterations,
                norm = report.final_gradient_norm,
                "ascent stopped at iteration limit"
            );
        }
        Ok(report)
    }

    /// Summarize the run so far
    pub fn report(&self) -> AscentReport {
        AscentReport {
            estimator: self.estimator.name().to_string(),
            parameter: self
                .parameter
                .as_ref()
                .map(|p| p.iter().copied().collect())
                .unwrap_or_default(),
            iterations: self.stats.iterations(),
            converged: self.is_finished(),
            final_gradient_norm: self.stats.last_gradient_norm().unwrap_or(f64::NAN),
            total_rollouts: self.stats.total_rollouts,
            unconverged_estimates: self.stats.unconverged_estimates,
            best_mean_reward: self.stats.best_mean_reward,
            gradient_norms: self.stats.gradient_norms(),
        }
    }
}
