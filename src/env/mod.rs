//! Environment traits and trajectories
//!
//! This module defines the step-based environment interface, the
//! [`Rollout`] capability consumed by the gradient estimators, and the
//! [`Trace`] type a rollout produces.
//!
//! Any [`Environment`] becomes a rollout source by wrapping it in
//! [`episodic::Episodic`], which runs one episode up to a fixed horizon.

use anyhow::Result;

use crate::policy::Policy;

pub mod episodic;
pub mod linear;

pub use episodic::Episodic;
pub use linear::LinearSystem;

/// Core trait for step-based RL environments
pub trait Environment {
    /// Observation type
    type Observation: Clone;

    /// Action type
    type Action: Clone;

    /// Reset the environment and return initial observation
    fn reset(&mut self) -> Result<Self::Observation>;

    /// Step the environment with an action
    fn step(&mut self, action: Self::Action) -> Result<StepResult<Self::Observation>>;
}

/// Result of an environment step
#[derive(Debug, Clone)]
pub struct StepResult<O> {
    /// Next observation
    pub observation: O,

    /// Reward received
    pub reward: f64,

    /// Whether the episode terminated
    pub terminated: bool,

    /// Whether the episode was truncated
    pub truncated: bool,
}

impl<O> StepResult<O> {
    /// Whether the environment signalled the end of the episode
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// One transition of a trajectory
///
/// `state` is the state the `action` was chosen in, which is where the
/// policy's score function is evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct Step<S, A> {
    /// Action taken
    pub action: A,

    /// State the action was taken in
    pub state: S,

    /// Reward received for the transition
    pub reward: f64,
}

/// An ordered, immutable sequence of steps from a single episode
#[derive(Debug, Clone, PartialEq)]
pub struct Trace<S, A> {
    steps: Vec<Step<S, A>>,
}

impl<S, A> Trace<S, A> {
    /// Wrap a finished list of steps
    pub fn new(steps: Vec<Step<S, A>>) -> Self {
        Self { steps }
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the trace has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Iterate over steps in order
    pub fn iter(&self) -> std::slice::Iter<'_, Step<S, A>> {
        self.steps.iter()
    }

    /// Borrow the steps as a slice
    pub fn steps(&self) -> &[Step<S, A>] {
        &self.steps
    }

    /// Sum of undiscounted rewards
    pub fn total_reward(&self) -> f64 {
        self.steps.iter().map(|s| s.reward).sum()
    }

    /// Average reward per step, `None` for an empty trace
    pub fn mean_reward(&self) -> Option<f64> {
        if self.steps.is_empty() {
            None
        } else {
            Some(self.total_reward() / self.steps.len() as f64)
        }
    }

    /// Discounted return `sum_k reward_k * lam^k`
    pub fn discounted_return(&self, lam: f64) -> f64 {
        let mut discount = 1.0;
        let mut ret = 0.0;
        for step in &self.steps {
            ret += step.reward * discount;
            discount *= lam;
        }
        ret
    }
}

impl<S, A> FromIterator<Step<S, A>> for Trace<S, A> {
    fn from_iter<I: IntoIterator<Item = Step<S, A>>>(iter: I) -> Self {
        Self { steps: iter.into_iter().collect() }
    }
}

impl<'a, S, A> IntoIterator for &'a Trace<S, A> {
    type Item = &'a Step<S, A>;
    type IntoIter = std::slice::Iter<'a, Step<S, A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Source of complete trajectories under a policy
///
/// Every call blocks until the episode is finished. Implementations must
/// return at most [`Rollout::horizon`] steps.
pub trait Rollout {
    /// State type recorded in traces
    type State;

    /// Action type recorded in traces
    type Action;

    /// Maximum episode length
    fn horizon(&self) -> usize;

    /// Run one episode with the policy's current parameter
    fn rollout<P>(&mut self, policy: &mut P) -> Result<Trace<Self::State, Self::Action>>
    where
        P: Policy<State = Self::State, Action = Self::Action>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(rewards: &[f64]) -> Trace<(), ()> {
        rewards.iter().map(|&reward| Step { action: (), state: (), reward }).collect()
    }

    #[test]
    fn test_mean_reward() {
        assert_eq!(trace(&[1.0, 2.0, 3.0]).mean_reward(), Some(2.0));
        assert_eq!(trace(&[]).mean_reward(), None);
    }

    #[test]
    fn test_discounted_return() {
        let t = trace(&[1.0, 1.0, 1.0]);
        assert!((t.discounted_return(0.5) - 1.75).abs() < 1e-12);
        assert!((t.discounted_return(1.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_step_result_done() {
        let result = StepResult { observation: 0, reward: 0.0, terminated: false, truncated: true };
        assert!(result.done());
    }
}
