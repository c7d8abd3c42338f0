//! GPOMDP with a per-timestep baseline
//!
//! GPOMDP exploits causality: the reward at step `k` is weighted only by the
//! score accumulated up to and including step `k`, since later actions cannot
//! influence it. Each timestep gets its own variance-minimizing baseline,
//! kept as a running average over the rollouts of one estimate:
//!
//! ```text
//! c_n[k]    = (sum_{j<=k} grad log pi(a_j | s_j))^2
//! b_div[k]  = n/(n+1) b_div[k] + c_n[k] / (n+1)
//! b_nom[k]  = n/(n+1) b_nom[k] + c_n[k] r_k lam^k / (n+1)
//! b[k]      = b_nom[k] / b_div[k]
//! g_n       = sum_k (sum_{j<=k} grad log pi_j) (r_k lam^k - b[k])
//! ```
//!
//! The estimate is the sum of `g_n` divided by the number of rollouts used.
//! Sampling stops once a single rollout's share `|g_n| / (n+1)` drops below
//! `eps` (after at least four rollouts); that last `g_n` is not added to the
//! sum. Otherwise it stops when `max_it` rollouts have been used.
//!
//! # References
//!
//! - Baxter & Bartlett, "Infinite-horizon policy-gradient estimation", 2001
//! - Peters & Schaal, "Reinforcement learning of motor skills with policy
//!   gradients", 2008

use nalgebra::{DMatrix, DVector};

use super::{
    Diagnostic, Estimate, EstimatorConfig, EstimatorKind, GradientEstimator, check_dimension,
    zero_non_finite,
};
use crate::env::Rollout;
use crate::error::{GradientError, Result};
use crate::policy::Policy;

/// GPOMDP likelihood-ratio estimator
#[derive(Debug, Clone)]
pub struct Gpomdp {
    max_it: usize,
    eps: f64,
    lam: f64,
    baseline: bool,
}

impl Gpomdp {
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

impl GradientEstimator for Gpomdp {
    fn name(&self) -> &'static str {
        "GPOMDP"
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

        let h = env.horizon();
        let d = parameter.len();

        // Row k holds the statistics of timestep k
        let mut b_nom = DMatrix::<f64>::zeros(h, d);
        let mut b_div = DMatrix::<f64>::zeros(h, d);
        let mut grad = DVector::<f64>::zeros(d);
        let mut last_trace = None;
        let mut change = f64::INFINITY;

        for n in 0..self.max_it {
            let trace = env.rollout(policy)?;
            if trace.len() > h {
                return Err(GradientError::DimensionMismatch { expected: h, actual: trace.len() });
            }

            let scores = trace
                .iter()
                .map(|step| policy.log_grad(&step.state, &step.action))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let weight = 1.0 / (n + 1) as f64;
            let fac = n as f64 * weight;

            // Discounted reward per timestep
            let mut discount = 1.0;
            let rewards: Vec<f64> = trace
                .iter()
                .map(|step| {
                    let r = step.reward * discount;
                    discount *= self.lam;
                    r
                })
                .collect();

            let baseline = if self.baseline {
                let mut b_n = DMatrix::<f64>::zeros(h, d);
                let mut cumulative = DVector::<f64>::zeros(d);
                for (k, score) in scores.iter().enumerate() {
                    cumulative += score;
                    for i in 0..d {
                        b_n[(k, i)] = cumulative[i] * cumulative[i];
                    }
                }

                b_div = &b_div * fac + &b_n * weight;
                b_nom *= fac;
                for (k, r) in rewards.iter().enumerate() {
                    for i in 0..d {
                        b_nom[(k, i)] += b_n[(k, i)] * r * weight;
                    }
                }

                // 0/0 where no score has been seen yet
                let mut b = b_nom.component_div(&b_div);
                b.apply(|x| {
                    if !x.is_finite() {
                        *x = 0.0;
                    }
                });
                b
            } else {
                DMatrix::zeros(h, d)
            };

            let mut update = DVector::<f64>::zeros(d);
            let mut grad_update = DVector::<f64>::zeros(d);
            for (k, (score, r)) in scores.iter().zip(&rewards).enumerate() {
                update += score;
                for i in 0..d {
                    grad_update[i] += update[i] * (r - baseline[(k, i)]);
                }
            }

            let finite = grad_update.iter().all(|x| x.is_finite());
            zero_non_finite(&mut grad_update);
            change = grad_update.norm() * weight;

            // The converging rollout is not folded into the estimate
            if n > 2 && finite && change < self.eps {
                grad *= weight;
                tracing::debug!(rollouts = n + 1, norm = grad.norm(), "gpomdp converged");
                return Ok(Estimate { gradient: grad, trace, rollouts: n + 1, diagnostic: None });
            }

            grad += grad_update;
            last_trace = Some(trace);
        }

        grad /= self.max_it as f64;
        let diagnostic = Diagnostic::not_converged(EstimatorKind::Gpomdp, self.max_it, change);
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

    fn raw_config(eps: f64) -> EstimatorConfig {
        EstimatorConfig::new().eps(eps).lam(1.0).baseline(false).max_it(10)
    }

    #[test]
    fn test_deterministic_policy_has_zero_gradient() {
        let mut env = Episodic::new(LinearSystem::scalar(0.0, 1.0, 1.0), 3).unwrap();
        let mut policy = LinearPolicy::new(1);
        let estimator = Gpomdp::new(&EstimatorConfig::default()).unwrap();
        let theta = DVector::from_vec(vec![0.5, 0.5]);

        let estimate = estimator.estimate(&mut policy, &mut env, &theta).unwrap();
        assert_eq!(estimate.gradient, DVector::zeros(2));
        assert!(estimate.converged());
        assert_eq!(estimate.trace.len(), 3);
    }

    #[test]
    fn test_first_rollout_is_fully_baselined() {
        // With a single rollout the baseline equals that rollout's reward, so
        // a one-step episode contributes nothing beyond rounding
        let mut env = Episodic::new(LinearSystem::scalar(0.0, 1.0, 1.0), 1).unwrap();
        let mut policy = LinearPolicy::gaussian(1, 0.5, 11).unwrap();
        let estimator = Gpomdp::new(&EstimatorConfig::new().max_it(1).eps(0.0)).unwrap();
        let theta = DVector::from_vec(vec![1.0, 0.0]);

        let estimate = estimator.estimate(&mut policy, &mut env, &theta).unwrap();
        assert!(estimate.gradient.norm() < 1e-9);
        assert!(!estimate.converged());
    }

    #[test]
    fn test_short_episodes_within_horizon() {
        let system = LinearSystem::scalar(0.5, 1.0, 1.0).with_max_steps(2);
        let mut env = Episodic::new(system, 5).unwrap();
        let mut policy = LinearPolicy::gaussian(1, 0.3, 2).unwrap();
        let estimator = Gpomdp::new(&EstimatorConfig::new().max_it(20)).unwrap();
        let theta = DVector::from_vec(vec![0.2, 0.1]);

        let estimate = estimator.estimate(&mut policy, &mut env, &theta).unwrap();
        assert_eq!(estimate.trace.len(), 2);
        assert!(estimate.gradient.iter().all(|g| g.is_finite()));
        assert_eq!(policy.parameter(), &theta);
    }

    #[test]
    fn test_converging_rollout_left_out_of_estimate() {
        // Raw updates g_n = score * reward = 4, 8, 12, 20; at n = 3 the share
        // 20 / 4 = 5 is below eps, so the estimate is (4 + 8 + 12) / 4
        let mut env = ScriptedRollout::new(&[(4.0, 1.0), (8.0, 1.0), (12.0, 1.0), (20.0, 1.0)]);
        let mut policy = ScorePolicy::new(1);
        let estimator = Gpomdp::new(&raw_config(10.0)).unwrap();

        let estimate = estimator.estimate(&mut policy, &mut env, &DVector::zeros(1)).unwrap();
        assert!(estimate.converged());
        assert_eq!(estimate.rollouts, 4);
        assert!((estimate.gradient[0] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_update_counts_as_zero() {
        // The infinite score at n = 3 must neither converge nor poison the sum
        let episodes = [(1.0, 1.0), (1.0, 1.0), (1.0, 1.0), (f64::INFINITY, 1.0), (2.0, 1.0)];
        let mut env = ScriptedRollout::new(&episodes);
        let mut policy = ScorePolicy::new(2);
        let estimator = Gpomdp::new(&raw_config(1e9)).unwrap();

        let estimate = estimator.estimate(&mut policy, &mut env, &DVector::zeros(2)).unwrap();
        assert!(estimate.converged());
        assert_eq!(estimate.rollouts, 5);
        assert!((estimate.gradient[0] - 0.6).abs() < 1e-12);
        assert!((estimate.gradient[1] - 0.6).abs() < 1e-12);

        // Same with the baseline, whose ratio turns into inf / inf
        let mut env = ScriptedRollout::new(&episodes);
        let estimator = Gpomdp::new(&raw_config(1e9).baseline(true)).unwrap();
        let estimate = estimator.estimate(&mut policy, &mut env, &DVector::zeros(2)).unwrap();
        assert!(estimate.rollouts > 4);
        assert!(estimate.gradient.iter().all(|g| g.is_finite()));
    }
}
