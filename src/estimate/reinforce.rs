//! REINFORCE with an episode-level baseline
//!
//! Each rollout contributes `S (R - b)` where `S` is the summed score of the
//! episode, `R` its discounted return and `b` Williams' variance-minimizing
//! baseline, computed per parameter dimension from all rollouts so far:
//!
//! ```text
//! b = sum_n S_n^2 R_n / sum_n S_n^2
//! ```
//!
//! The estimate is the running mean of these contributions. Sampling stops
//! once the running mean moves by less than `eps` between two rollouts (after
//! at least four rollouts) or when `max_it` rollouts have been used.
//!
//! # References
//!
//! - Williams, "Simple statistical gradient-following algorithms for
//!   connectionist reinforcement learning", 1992

use nalgebra::DVector;

use super::{
    Diagnostic, Estimate, EstimatorConfig, EstimatorKind, GradientEstimator, check_dimension,
    zero_non_finite,
};
use crate::env::Rollout;
use crate::error::{GradientError, Result};
use crate::policy::Policy;

/// REINFORCE likelihood-ratio estimator
#[derive(Debug, Clone)]
pub struct Reinforce {
    max_it: usize,
    eps: f64,
    lam: f64,
    baseline: bool,
}

impl Reinforce {
    /// Create from a validated configuration
    pub fn new(config: &EstimatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            max_it: config.max_it,
            eps: config.eps,
            lam: config.lam,
            baseline: config.baseline,
        })
    }
}

impl GradientEstimator for Reinforce {
    fn name(&self) -> &'static str {
        "Reinforce"
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
        check_dimension(policy, parameter)?;
        policy.set_parameter(parameter.clone())?;

        let d = parameter.len();
        let mut b_div = DVector::zeros(d);
        let mut b_nom = DVector::zeros(d);
        let mut grads = DVector::zeros(d);
        let mut grad = DVector::zeros(d);
        let mut last_trace = None;
        let mut change = f64::INFINITY;

        for n in 0..self.max_it {
            let trace = env.rollout(policy)?;

            let ret = trace.discounted_return(self.lam);
            let mut score = DVector::zeros(d);
            for step in &trace {
                score += policy.log_grad(&step.state, &step.action)?;
            }

            let mut contribution = if self.baseline {
                let score_sq = score.component_mul(&score);
                b_nom += &score_sq * ret;
                b_div += score_sq;

                let mut b = b_nom.component_div(&b_div);
                zero_non_finite(&mut b);
                score.zip_map(&b, |s, bi| s * (ret - bi))
            } else {
                &score * ret
            };
            zero_non_finite(&mut contribution);
            grads += contribution;

            let grad_old = std::mem::replace(&mut grad, &grads / (n + 1) as f64);
            change = (&grad - &grad_old).norm();
            last_trace = Some(trace);

            if n > 2 && change < self.eps {
                tracing::debug!(rollouts = n + 1, norm = grad.norm(), "reinforce converged");
                let trace = last_trace.ok_or(GradientError::EmptyTrace)?;
                return Ok(Estimate { gradient: grad, trace, rollouts: n + 1, diagnostic: None });
            }
        }

        let diagnostic = Diagnostic::not_converged(EstimatorKind::Reinforce, self.max_it, change);
        let trace = last_trace.ok_or(GradientError::EmptyTrace)?;
        Ok(Estimate { gradient: grad, trace, rollouts: self.max_it, diagnostic: Some(diagnostic) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Episodic, LinearSystem};
    use crate::estimate::testing::{ScorePolicy, ScriptedRollout};
    use crate::policy::LinearPolicy;

    #[test]
    fn test_deterministic_policy_has_zero_gradient() {
        let mut env = Episodic::new(LinearSystem::scalar(0.0, 1.0, 1.0), 1).unwrap();
        let mut policy = LinearPolicy::new(1);
        let estimator = Reinforce::new(&EstimatorConfig::default()).unwrap();
        let theta = DVector::from_vec(vec![1.0, 1.0]);

        // Zero score makes the baseline 0/0, which must not leak NaN
        let estimate = estimator.estimate(&mut policy, &mut env, &theta).unwrap();
        assert_eq!(estimate.gradient, DVector::zeros(2));
        assert!(estimate.converged());
        assert_eq!(estimate.rollouts, 4);
    }

    #[test]
    fn test_non_convergence_is_reported() {
        let mut env = Episodic::new(LinearSystem::scalar(0.0, 1.0, 1.0), 1).unwrap();
        let mut policy = LinearPolicy::gaussian(1, 0.5, 3).unwrap();
        let config = EstimatorConfig::new().max_it(5).eps(0.0);
        let estimator = Reinforce::new(&config).unwrap();
        let theta = DVector::from_vec(vec![1.0, 0.0]);

        let estimate = estimator.estimate(&mut policy, &mut env, &theta).unwrap();
        assert!(!estimate.converged());
        assert_eq!(estimate.rollouts, 5);
        assert!(matches!(
            estimate.diagnostic,
            Some(Diagnostic::NotConverged { estimator: EstimatorKind::Reinforce, rollouts: 5, .. })
        ));
        assert!(estimate.gradient.iter().all(|g| g.is_finite()));
    }

    #[test]
    fn test_policy_left_at_parameter() {
        let mut env = Episodic::new(LinearSystem::scalar(0.0, 1.0, 1.0), 2).unwrap();
        let mut policy = LinearPolicy::gaussian(1, 0.2, 5).unwrap();
        let estimator = Reinforce::new(&EstimatorConfig::new().max_it(10)).unwrap();
        let theta = DVector::from_vec(vec![0.4, -0.1]);

        estimator.estimate(&mut policy, &mut env, &theta).unwrap();
        assert_eq!(policy.parameter(), &theta);
    }

    #[test]
    fn test_non_finite_contribution_counts_as_zero() {
        let episodes = [(1.0, 1.0), (1.0, 1.0), (1.0, 1.0), (f64::INFINITY, 1.0)];

        // Raw contributions 1, 1, 1, inf -> 1, 1, 1, 0
        let config = EstimatorConfig::new().eps(1e9).lam(1.0).baseline(false);
        let estimator = Reinforce::new(&config).unwrap();
        let mut env = ScriptedRollout::new(&episodes);
        let mut policy = ScorePolicy::new(1);
        let estimate = estimator.estimate(&mut policy, &mut env, &DVector::zeros(1)).unwrap();
        assert_eq!(estimate.rollouts, 4);
        assert!((estimate.gradient[0] - 0.75).abs() < 1e-12);

        let estimator = Reinforce::new(&config.baseline(true)).unwrap();
        let mut env = ScriptedRollout::new(&episodes);
        let estimate = estimator.estimate(&mut policy, &mut env, &DVector::zeros(1)).unwrap();
        assert!(estimate.gradient.iter().all(|g| g.is_finite()));
    }
}
