//! Scripted collaborators for estimator tests

use anyhow::{Result, bail};
use nalgebra::DVector;

use crate::env::{Rollout, Step, Trace};
use crate::policy::Policy;

/// Policy whose score in every dimension is the recorded action itself
#[derive(Debug, Clone)]
pub struct ScorePolicy {
    parameter: DVector<f64>,
}

impl ScorePolicy {
    pub fn new(dim: usize) -> Self {
        Self { parameter: DVector::zeros(dim) }
    }
}

impl Policy for ScorePolicy {
    type State = ();
    type Action = f64;

    fn parameter(&self) -> &DVector<f64> {
        &self.parameter
    }

    fn set_parameter(&mut self, parameter: DVector<f64>) -> Result<()> {
        if parameter.len() != self.parameter.len() {
            bail!("expected {} parameters, got {}", self.parameter.len(), parameter.len());
        }
        self.parameter = parameter;
        Ok(())
    }

    fn parameter_shape(&self) -> usize {
        self.parameter.len()
    }

    fn act(&mut self, _state: &()) -> Result<f64> {
        Ok(0.0)
    }

    fn log_grad(&self, _state: &(), action: &f64) -> Result<DVector<f64>> {
        Ok(DVector::from_element(self.parameter.len(), *action))
    }
}

/// Replays one-step episodes `(score, reward)` in order, then starts over
#[derive(Debug, Clone)]
pub struct ScriptedRollout {
    episodes: Vec<(f64, f64)>,
    next: usize,
}

impl ScriptedRollout {
    pub fn new(episodes: &[(f64, f64)]) -> Self {
        Self { episodes: episodes.to_vec(), next: 0 }
    }
}

impl Rollout for ScriptedRollout {
    type State = ();
    type Action = f64;

    fn horizon(&self) -> usize {
        1
    }

    fn rollout<P>(&mut self, _policy: &mut P) -> Result<Trace<(), f64>>
    where
        P: Policy<State = (), Action = f64>,
    {
        let (action, reward) = self.episodes[self.next % self.episodes.len()];
        self.next += 1;
        Ok(Trace::new(vec![Step { action, state: (), reward }]))
    }
}

/// Delegates to `inner` but fails the `fail_on`-th rollout (1-based)
#[derive(Debug, Clone)]
pub struct FailingRollout<R> {
    inner: R,
    fail_on: usize,
    calls: usize,
}

impl<R> FailingRollout<R> {
    pub fn new(inner: R, fail_on: usize) -> Self {
        Self { inner, fail_on, calls: 0 }
    }
}

impl<R: Rollout> Rollout for FailingRollout<R> {
    type State = R::State;
    type Action = R::Action;

    fn horizon(&self) -> usize {
        self.inner.horizon()
    }

    fn rollout<P>(&mut self, policy: &mut P) -> Result<Trace<R::State, R::Action>>
    where
        P: Policy<State = R::State, Action = R::Action>,
    {
        self.calls += 1;
        if self.calls == self.fail_on {
            bail!("simulator crashed on rollout {}", self.calls);
        }
        self.inner.rollout(policy)
    }
}
