//! Policy gradient estimators
//!
//! Four interchangeable estimators of `grad_theta J(theta)`, where `J` is the
//! expected reward of a policy, computed from black-box rollouts only:
//!
//! | Key          | Estimator                 | Rollouts per estimate |
//! |--------------|---------------------------|-----------------------|
//! | `forward_fd` | [`ForwardFd`]             | `D + 1`               |
//! | `central_fd` | [`CentralFd`]             | `2 D`                 |
//! | `reinforce`  | [`Reinforce`]             | up to `max_it`        |
//! | `gpomdp`     | [`Gpomdp`]                | up to `max_it`        |
//!
//! All estimators take the parameter to differentiate at explicitly and
//! leave the policy set to that parameter when they return.
//!
//! # Example
//!
//! ```rust
//! use nalgebra::DVector;
//! use thrust_pg::env::{Episodic, LinearSystem};
//! use thrust_pg::estimate::{Estimator, EstimatorConfig, GradientEstimator};
//! use thrust_pg::policy::LinearPolicy;
//!
//! let config = EstimatorConfig::new().var(1e-3);
//! let estimator = Estimator::from_key("central_fd", &config).unwrap();
//!
//! let mut env = Episodic::new(LinearSystem::scalar(0.0, 1.0, 1.0), 1).unwrap();
//! let mut policy = LinearPolicy::new(1);
//! let theta = DVector::from_vec(vec![1.0, 0.0]);
//!
//! let estimate = estimator.estimate(&mut policy, &mut env, &theta).unwrap();
//! // J = -(theta_0 + theta_1)^2  =>  grad = (-2, -2)
//! assert!((estimate.gradient[0] + 2.0).abs() < 1e-6);
//! ```

use std::fmt;
use std::str::FromStr;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::env::{Rollout, Trace};
use crate::error::{GradientError, Result};
use crate::policy::Policy;

pub mod config;
pub mod finite_diff;
pub mod gpomdp;
pub mod reinforce;

#[cfg(test)]
pub(crate) mod testing;

pub use config::EstimatorConfig;
pub use finite_diff::{CentralFd, ForwardFd};
pub use gpomdp::Gpomdp;
pub use reinforce::Reinforce;

/// A single gradient estimate
#[derive(Debug, Clone)]
pub struct Estimate<S, A> {
    /// Estimated gradient, one entry per parameter dimension
    pub gradient: DVector<f64>,

    /// Reference (finite differences) or last (likelihood ratio) trace
    pub trace: Trace<S, A>,

    /// Number of rollouts the estimate consumed
    pub rollouts: usize,

    /// Set when the estimator stopped without meeting its tolerance
    pub diagnostic: Option<Diagnostic>,
}

impl<S, A> Estimate<S, A> {
    /// Euclidean norm of the gradient
    pub fn norm(&self) -> f64 {
        self.gradient.norm()
    }

    /// Whether the estimator met its own convergence criterion
    pub fn converged(&self) -> bool {
        self.diagnostic.is_none()
    }
}

/// Soft conditions reported alongside an estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// The rollout budget ran out before the tolerance was met
    NotConverged {
        /// Estimator that gave up
        estimator: EstimatorKind,
        /// Rollouts performed
        rollouts: usize,
        /// Value of the convergence criterion after the last rollout
        last_change: f64,
    },
}

impl Diagnostic {
    pub(crate) fn not_converged(
        estimator: EstimatorKind,
        rollouts: usize,
        last_change: f64,
    ) -> Self {
        tracing::warn!(
            estimator = estimator.as_str(),
            rollouts,
            last_change,
            "gradient estimate did not converge"
        );
        Diagnostic::NotConverged { estimator, rollouts, last_change }
    }
}

/// Common interface of all gradient estimators
pub trait GradientEstimator {
    /// Human-readable estimator name
    fn name(&self) -> &'static str;

    /// Estimate the gradient of the expected reward at `parameter`
    ///
    /// The policy is left set to `parameter` on return.
    fn estimate<R, P>(
        &self,
        policy: &mut P,
        env: &mut R,
        parameter: &DVector<f64>,
    ) -> Result<Estimate<R::State, R::Action>>
    where
        R: Rollout,
        P: Policy<State = R::State, Action = R::Action>;
}

/// Registered estimator kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    /// Forward finite differences
    ForwardFd,
    /// Central finite differences
    CentralFd,
    /// REINFORCE with per-dimension baseline
    Reinforce,
    /// GPOMDP with per-timestep baseline
    Gpomdp,
}

impl EstimatorKind {
    /// Every registered kind, in registry order
    pub const ALL: [EstimatorKind; 4] = [
        EstimatorKind::ForwardFd,
        EstimatorKind::CentralFd,
        EstimatorKind::Reinforce,
        EstimatorKind::Gpomdp,
    ];

    /// Registry key
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimatorKind::ForwardFd => "forward_fd",
            EstimatorKind::CentralFd => "central_fd",
            EstimatorKind::Reinforce => "reinforce",
            EstimatorKind::Gpomdp => "gpomdp",
        }
    }

    /// Whether the estimator samples a stochastic rollout loop
    pub fn is_likelihood_ratio(&self) -> bool {
        matches!(self, EstimatorKind::Reinforce | EstimatorKind::Gpomdp)
    }
}

impl fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EstimatorKind {
    type Err = GradientError;

    fn from_str(key: &str) -> Result<Self> {
        EstimatorKind::ALL.into_iter().find(|kind| kind.as_str() == key).ok_or_else(|| {
            GradientError::UnknownEstimator {
                key: key.to_string(),
                expected: EstimatorKind::ALL.map(|k| k.as_str()).join(", "),
            }
        })
    }
}

/// Any registered estimator, dispatching to the concrete implementation
#[derive(Debug, Clone)]
pub enum Estimator {
    /// Forward finite differences
    ForwardFd(ForwardFd),
    /// Central finite differences
    CentralFd(CentralFd),
    /// REINFORCE
    Reinforce(Reinforce),
    /// GPOMDP
    Gpomdp(Gpomdp),
}

impl Estimator {
    /// Construct an estimator of the given kind
    pub fn new(kind: EstimatorKind, config: &EstimatorConfig) -> Result<Self> {
        Ok(match kind {
            EstimatorKind::ForwardFd => Estimator::ForwardFd(ForwardFd::new(config)?),
            EstimatorKind::CentralFd => Estimator::CentralFd(CentralFd::new(config)?),
            EstimatorKind::Reinforce => Estimator::Reinforce(Reinforce::new(config)?),
            EstimatorKind::Gpomdp => Estimator::Gpomdp(Gpomdp::new(config)?),
        })
    }

    /// Resolve a registry key and construct the estimator
    pub fn from_key(key: &str, config: &EstimatorConfig) -> Result<Self> {
        Self::new(key.parse()?, config)
    }

    /// Kind of the wrapped estimator
    pub fn kind(&self) -> EstimatorKind {
        match self {
            Estimator::ForwardFd(_) => EstimatorKind::ForwardFd,
            Estimator::CentralFd(_) => EstimatorKind::CentralFd,
            Estimator::Reinforce(_) => EstimatorKind::Reinforce,
            Estimator::Gpomdp(_) => EstimatorKind::Gpomdp,
        }
    }
}

impl GradientEstimator for Estimator {
    fn name(&self) -> &'static str {
        match self {
            Estimator::ForwardFd(e) => e.name(),
            Estimator::CentralFd(e) => e.name(),
            Estimator::Reinforce(e) => e.name(),
            Estimator::Gpomdp(e) => e.name(),
        }
    }

    fn estimate<R, P>(
        &self,
        policy: &mut P,
        env: &mut R,
        parameter: &DVector<f64>,
    ) -> Result<Estimate<R::State, R::Action>>
    where
        R: Rollout,
        P: Policy<State = R::State, Action = R::Action>,
    {
        match self {
            Estimator::ForwardFd(e) => e.estimate(policy, env, parameter),
            Estimator::CentralFd(e) => e.estimate(policy, env, parameter),
            Estimator::Reinforce(e) => e.estimate(policy, env, parameter),
            Estimator::Gpomdp(e) => e.estimate(policy, env, parameter),
        }
    }
}

/// Fail unless `parameter` fits the policy
pub(crate) fn check_dimension<P: Policy>(policy: &P, parameter: &DVector<f64>) -> Result<()> {
    let expected = policy.parameter_shape();
    if parameter.len() != expected {
        return Err(GradientError::DimensionMismatch { expected, actual: parameter.len() });
    }
    Ok(())
}

/// Average reward per step of a trace
pub(crate) fn mean_reward<S, A>(trace: &Trace<S, A>) -> Result<f64> {
    trace.mean_reward().ok_or(GradientError::EmptyTrace)
}

/// Replace NaN and infinities by zero
pub(crate) fn zero_non_finite(v: &mut DVector<f64>) {
    for x in v.iter_mut() {
        if !x.is_finite() {
            *x = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_keys() {
        for kind in EstimatorKind::ALL {
            assert_eq!(kind.as_str().parse::<EstimatorKind>().unwrap(), kind);
        }
        assert_eq!("gpomdp".parse::<EstimatorKind>().unwrap(), EstimatorKind::Gpomdp);
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let err = Estimator::from_key("bogus_fd", &EstimatorConfig::default()).unwrap_err();
        assert!(err.is_config());
        assert!(matches!(
            err,
            GradientError::UnknownEstimator { ref key, .. } if key == "bogus_fd"
        ));
        assert!(err.to_string().contains("forward_fd"));
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = EstimatorConfig::new().lam(2.0);
        for kind in EstimatorKind::ALL {
            assert!(Estimator::new(kind, &config).unwrap_err().is_config());
        }
    }

    #[test]
    fn test_estimator_kind_roundtrip() {
        for kind in EstimatorKind::ALL {
            let estimator = Estimator::new(kind, &EstimatorConfig::default()).unwrap();
            assert_eq!(estimator.kind(), kind);
        }
    }

    #[test]
    fn test_zero_non_finite() {
        let mut v = DVector::from_vec(vec![1.0, f64::NAN, f64::INFINITY, -2.0]);
        zero_non_finite(&mut v);
        assert_eq!(v, DVector::from_vec(vec![1.0, 0.0, 0.0, -2.0]));
    }
}
