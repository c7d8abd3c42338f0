//! Horizon-bounded episodes over a step-based environment
//!
//! [`Episodic`] adapts any [`Environment`] to the [`Rollout`] capability:
//! each call resets the environment, lets the policy act until the horizon
//! is reached or the environment reports the episode as done, and returns
//! the collected trace.

use anyhow::Result;

use super::{Environment, Rollout, Step, Trace};
use crate::error::GradientError;
use crate::policy::Policy;

/// Fixed-horizon rollout wrapper around an environment
#[derive(Debug, Clone)]
pub struct Episodic<E> {
    env: E,
    horizon: usize,
}

impl<E: Environment> Episodic<E> {
    /// Wrap `env`, cutting episodes after `horizon` steps
    pub fn new(env: E, horizon: usize) -> crate::Result<Self> {
        if horizon == 0 {
            return Err(GradientError::InvalidConfig("horizon must be positive".into()));
        }
        Ok(Self { env, horizon })
    }

    /// Borrow the wrapped environment
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Mutably borrow the wrapped environment
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Unwrap the environment
    pub fn into_inner(self) -> E {
        self.env
    }
}

impl<E: Environment> Rollout for Episodic<E> {
    type State = E::Observation;
    type Action = E::Action;

    fn horizon(&self) -> usize {
        self.horizon
    }

    fn rollout<P>(&mut self, policy: &mut P) -> Result<Trace<E::Observation, E::Action>>
    where
        P: Policy<State = E::Observation, Action = E::Action>,
    {
        let mut state = self.env.reset()?;
        let mut steps = Vec::with_capacity(self.horizon);

        for _ in 0..self.horizon {
            let action = policy.act(&state)?;
            let result = self.env.step(action.clone())?;
            let done = result.done();

            steps.push(Step { action, state, reward: result.reward });
            state = result.observation;

            if done {
                break;
            }
        }

        Ok(Trace::new(steps))
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::DVector;

    use super::*;
    use crate::env::LinearSystem;
    use crate::policy::LinearPolicy;

    #[test]
    fn test_rollout_respects_horizon() {
        let env = LinearSystem::scalar(1.0, 1.0, 1.0);
        let mut rollout = Episodic::new(env, 5).unwrap();
        let mut policy = LinearPolicy::new(1);

        let trace = rollout.rollout(&mut policy).unwrap();
        assert_eq!(trace.len(), 5);
        assert_eq!(rollout.horizon(), 5);
    }

    #[test]
    fn test_rollout_stops_when_done() {
        let env = LinearSystem::scalar(1.0, 1.0, 1.0).with_max_steps(3);
        let mut rollout = Episodic::new(env, 10).unwrap();
        let mut policy = LinearPolicy::new(1);

        let trace = rollout.rollout(&mut policy).unwrap();
        assert_eq!(trace.len(), 3);
    }

    #[test]
    fn test_trace_records_state_before_action() {
        // s' = s + a, policy a = 1 => states 0, 1, 2
        let env = LinearSystem::scalar(1.0, 1.0, 0.0);
        let mut rollout = Episodic::new(env, 3).unwrap();
        let mut policy =
            LinearPolicy::new(1).with_parameter(DVector::from_vec(vec![0.0, 1.0])).unwrap();

        let trace = rollout.rollout(&mut policy).unwrap();
        let states: Vec<f64> = trace.iter().map(|s| s.state[0]).collect();
        assert_eq!(states, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let env = LinearSystem::scalar(1.0, 1.0, 1.0);
        assert!(Episodic::new(env, 0).unwrap_err().is_config());
    }
}
