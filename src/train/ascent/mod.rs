//! Policy gradient ascent
//!
//! ```text
//! Initialize:
//!   repeat: sample theta from the parameter space
//!   until |estimate(theta)| >= eps
//! Ascend:
//!   repeat:
//!     g = estimate(theta)
//!     theta <- theta + rate * g
//!   until |g| < eps or max_it iterations
//! ```
//!
//! # Example
//!
//! ```rust
//! use thrust_pg::env::{Episodic, LinearSystem};
//! use thrust_pg::estimate::EstimatorKind;
//! use thrust_pg::policy::LinearPolicy;
//! use thrust_pg::train::{AscentConfig, PolicyGradient};
//!
//! let config = AscentConfig::new().estimator(EstimatorKind::CentralFd).rate(0.25).eps(1e-6);
//! let mut pg = PolicyGradient::new(config).unwrap();
//!
//! let mut env = Episodic::new(LinearSystem::scalar(0.0, 1.0, 1.0), 1).unwrap();
//! let mut policy = LinearPolicy::new(1);
//!
//! let report = pg.optimize(&mut policy, &mut env).unwrap();
//! assert!(report.converged);
//! ```

pub mod config;
pub mod stats;
pub mod trainer;

pub use config::AscentConfig;
pub use stats::{AscentReport, AscentStats, IterationStats};
pub use trainer::{AscentState, PolicyGradient};
