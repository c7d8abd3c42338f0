//! Parametric policies
//!
//! The estimators only ever touch a policy through the [`Policy`] trait:
//! they read and write its parameter vector, let it act during rollouts and
//! query the score function `log_grad`.
//!
//! A policy is a single mutable resource. Estimators borrow it mutably for
//! the whole call, so only one estimate can be in flight per instance;
//! sharing a policy across threads is up to the caller.

use anyhow::Result;
use nalgebra::DVector;

pub mod linear;

pub use linear::LinearPolicy;

/// A differentiable parametric policy
pub trait Policy {
    /// State the policy observes
    type State;

    /// Action the policy emits
    type Action;

    /// Current parameter vector
    fn parameter(&self) -> &DVector<f64>;

    /// Replace the parameter vector
    fn set_parameter(&mut self, parameter: DVector<f64>) -> Result<()>;

    /// Dimension of the parameter vector
    fn parameter_shape(&self) -> usize;

    /// Choose an action in `state` under the current parameter
    fn act(&mut self, state: &Self::State) -> Result<Self::Action>;

    /// Gradient of `log pi(action | state)` with respect to the parameter
    fn log_grad(&self, state: &Self::State, action: &Self::Action) -> Result<DVector<f64>>;
}
