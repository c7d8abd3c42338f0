//! Error types for gradient estimation and ascent

use thiserror::Error;

/// Errors raised while configuring or running a gradient estimator
///
/// Non-convergence of a stochastic estimator is not an error: it is reported
/// through [`crate::estimate::Diagnostic`] on the returned estimate.
#[derive(Debug, Error)]
pub enum GradientError {
    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The requested estimator key is not registered
    #[error("unknown estimator '{key}' (expected one of: {expected})")]
    UnknownEstimator {
        /// Key that failed to resolve
        key: String,
        /// Comma-separated list of registered keys
        expected: String,
    },

    /// The finite-difference normal equations could not be solved
    #[error("perturbation system is rank deficient ({dim}x{dim} normal matrix)")]
    Singular {
        /// Dimension of the normal matrix
        dim: usize,
    },

    /// Two vectors that must agree in length do not
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// A rollout produced no steps, so no mean reward exists
    #[error("rollout returned an empty trace")]
    EmptyTrace,

    /// No sampled starting parameter produced a usable gradient
    #[error("no starting parameter with gradient norm >= {eps} after {attempts} attempts")]
    InitializationFailed {
        /// Number of candidates sampled
        attempts: usize,
        /// Gradient-norm floor
        eps: f64,
    },

    /// `step` was called before `initialize`
    #[error("ascent driver has not been initialized")]
    NotInitialized,

    /// Failure reported by the environment or policy collaborator
    #[error(transparent)]
    Environment(#[from] anyhow::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, GradientError>;

impl GradientError {
    /// Whether this error was raised while validating configuration
    pub fn is_config(&self) -> bool {
        matches!(self, GradientError::InvalidConfig(_) | GradientError::UnknownEstimator { .. })
    }
}
