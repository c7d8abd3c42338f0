//! # Thrust PG
//!
//! Black-box policy gradient estimation in Rust
//!
//! Thrust PG estimates the gradient of a policy's expected reward from
//! rollouts alone, and climbs it. Four estimators are provided: forward and
//! central finite differences, which perturb the parameter, and the
//! likelihood-ratio estimators REINFORCE and GPOMDP, which use the policy's
//! score function.
//!
//! ## Quick Start
//!
//! ```rust
//! use thrust_pg::prelude::*;
//!
//! // One-step scalar system s' = a, reward -s'^2
//! let mut env = Episodic::new(LinearSystem::scalar(0.0, 1.0, 1.0), 1).unwrap();
//! let mut policy = LinearPolicy::new(1);
//!
//! let config = AscentConfig::new().estimator(EstimatorKind::CentralFd).rate(0.25).eps(1e-6);
//! let mut pg = PolicyGradient::new(config).unwrap();
//! let report = pg.optimize(&mut policy, &mut env).unwrap();
//!
//! assert!(report.converged);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Environment traits, episodic rollouts and a linear test system
pub mod env;

/// Error types
pub mod error;

/// Gradient estimators and their registry
pub mod estimate;

/// Parameter spaces used to draw starting points
pub mod optimize;

/// Parametric policies
pub mod policy;

/// Gradient ascent
pub mod train;

/// Utility functions and helpers
pub mod utils;

pub use error::{GradientError, Result};

/// Prelude module for convenient imports
///
/// This module re-exports commonly used types and traits for convenience.
pub mod prelude {
    pub use crate::env::{Environment, Episodic, LinearSystem, Rollout, Trace};
    pub use crate::error::{GradientError, Result};
    pub use crate::estimate::{
        CentralFd, Estimate, Estimator, EstimatorConfig, EstimatorKind, ForwardFd, Gpomdp,
        GradientEstimator, Reinforce,
    };
    pub use crate::optimize::{BoundedSpace, BoundsConfig, ParameterSpace};
    pub use crate::policy::{LinearPolicy, Policy};
    pub use crate::train::{AscentConfig, AscentReport, PolicyGradient};
}

/// Current version of thrust-pg
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
