//! Finite-difference gradient estimators
//!
//! Both estimators perturb the parameter one coordinate at a time, measure
//! the change in mean reward per step and recover the gradient from the
//! least-squares system
//!
//! ```text
//! (dV^T dV) g = dV^T dJ
//! ```
//!
//! where row `i` of `dV` is the parameter displacement behind the reward
//! difference `dJ[i]`. Larger perturbations add bias, smaller ones amplify
//! reward noise.
//!
//! Probes run in index order and the policy is put back to the requested
//! parameter afterwards, including when a rollout fails.

use nalgebra::{DMatrix, DVector};

use super::{Estimate, EstimatorConfig, GradientEstimator, check_dimension, mean_reward};
use crate::env::{Rollout, Trace};
use crate::error::{GradientError, Result};
use crate::policy::Policy;

/// Forward finite differences, `D + 1` rollouts per estimate
#[derive(Debug, Clone)]
pub struct ForwardFd {
    var: f64,
}

/// Central finite differences, `2 D` rollouts per estimate
#[derive(Debug, Clone)]
pub struct CentralFd {
    var: f64,
}

impl ForwardFd {
    /// Create from a validated configuration
    pub fn new(config: &EstimatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { var: config.var })
    }

    /// Perturbation size
    pub fn var(&self) -> f64 {
        self.var
    }

    /// Estimate with an explicit perturbation size
    pub fn estimate_with_scale<R, P>(
        &self,
        policy: &mut P,
        env: &mut R,
        parameter: &DVector<f64>,
        variation_scale: f64,
    ) -> Result<Estimate<R::State, R::Action>>
    where
        R: Rollout,
        P: Policy<State = R::State, Action = R::Action>,
    {
        check_scale(variation_scale)?;
        check_dimension(policy, parameter)?;

        let probed = forward_probes(policy, env, parameter, variation_scale);
        policy.set_parameter(parameter.clone())?;
        let (dv, dj, trace) = probed?;

        let gradient = solve_normal_equations(&dv, &dj)?;
        tracing::debug!(norm = gradient.norm(), "forward finite-difference estimate");

        Ok(Estimate { gradient, trace, rollouts: parameter.len() + 1, diagnostic: None })
    }
}

impl CentralFd {
    /// Create from a validated configuration
    pub fn new(config: &EstimatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { var: config.var })
    }

    /// Perturbation size (distance between the two probes)
    pub fn var(&self) -> f64 {
        self.var
    }

    /// Estimate with an explicit perturbation size
    pub fn estimate_with_scale<R, P>(
        &self,
        policy: &mut P,
        env: &mut R,
        parameter: &DVector<f64>,
        variation_scale: f64,
    ) -> Result<Estimate<R::State, R::Action>>
    where
        R: Rollout,
        P: Policy<State = R::State, Action = R::Action>,
    {
        check_scale(variation_scale)?;
        check_dimension(policy, parameter)?;

        let probed = central_probes(policy, env, parameter, variation_scale);
        policy.set_parameter(parameter.clone())?;
        let (dv, dj, trace) = probed?;

        let gradient = solve_normal_equations(&dv, &dj)?;
        tracing::debug!(norm = gradient.norm(), "central finite-difference estimate");

        Ok(Estimate { gradient, trace, rollouts: 2 * parameter.len(), diagnostic: None })
    }
}

impl GradientEstimator for ForwardFd {
    fn name(&self) -> &'static str {
        "Forward Finite Differences"
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
        self.estimate_with_scale(policy, env, parameter, self.var)
    }
}

impl GradientEstimator for CentralFd {
    fn name(&self) -> &'static str {
        "Central Finite Differences"
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
        self.estimate_with_scale(policy, env, parameter, self.var)
    }
}

type Probes<S, A> = (DMatrix<f64>, DVector<f64>, Trace<S, A>);

/// Reference rollout plus one forward probe per coordinate
///
/// The system has `2 D` rows: the forward probes `+var e_i` followed by
/// rows reserved for backward probes, which are never populated and stay
/// zero.
fn forward_probes<R, P>(
    policy: &mut P,
    env: &mut R,
    parameter: &DVector<f64>,
    var: f64,
) -> Result<Probes<R::State, R::Action>>
where
    R: Rollout,
    P: Policy<State = R::State, Action = R::Action>,
{
    let d = parameter.len();

    policy.set_parameter(parameter.clone())?;
    let reference = env.rollout(policy)?;
    let j_ref = mean_reward(&reference)?;

    let mut dv = DMatrix::zeros(2 * d, d);
    let mut dj = DVector::zeros(2 * d);

    for i in 0..d {
        dv[(i, i)] = var;

        let mut probe = parameter.clone();
        probe[i] += var;
        policy.set_parameter(probe)?;
        let trace = env.rollout(policy)?;

        dj[i] = mean_reward(&trace)? - j_ref;
    }

    Ok((dv, dj, reference))
}

/// Symmetric probes at `+-var/2` per coordinate
fn central_probes<R, P>(
    policy: &mut P,
    env: &mut R,
    parameter: &DVector<f64>,
    var: f64,
) -> Result<Probes<R::State, R::Action>>
where
    R: Rollout,
    P: Policy<State = R::State, Action = R::Action>,
{
    let d = parameter.len();
    let half = var / 2.0;

    let mut dv = DMatrix::zeros(d, d);
    let mut dj = DVector::zeros(d);
    let mut last = None;

    for i in 0..d {
        dv[(i, i)] = var;

        let mut plus = parameter.clone();
        plus[i] += half;
        policy.set_parameter(plus)?;
        let trace_plus = env.rollout(policy)?;

        let mut minus = parameter.clone();
        minus[i] -= half;
        policy.set_parameter(minus)?;
        let trace_minus = env.rollout(policy)?;

        dj[i] = mean_reward(&trace_plus)? - mean_reward(&trace_minus)?;
        last = Some(trace_minus);
    }

    let trace = last.ok_or(GradientError::EmptyTrace)?;
    Ok((dv, dj, trace))
}

/// Solve `(dV^T dV) x = dV^T dJ` by Cholesky factorization
///
/// A rank-deficient `dV` leaves the normal matrix singular, which is
/// reported instead of returning a meaningless solution.
pub fn solve_normal_equations(dv: &DMatrix<f64>, dj: &DVector<f64>) -> Result<DVector<f64>> {
    let dim = dv.ncols();
    let normal = dv.transpose() * dv;
    let rhs = dv.transpose() * dj;

    if !normal.iter().all(|x| x.is_finite()) {
        return Err(GradientError::Singular { dim });
    }
    let cholesky = normal.cholesky().ok_or(GradientError::Singular { dim })?;

    // Pivots that vanish relative to the largest one mean dV lost rank
    let pivots = cholesky.l_dirty().diagonal();
    let largest = pivots.max();
    if pivots.min() <= largest * f64::EPSILON.sqrt() {
        return Err(GradientError::Singular { dim });
    }

    let solution = cholesky.solve(&rhs);
    if solution.iter().all(|x| x.is_finite()) {
        Ok(solution)
    } else {
        Err(GradientError::Singular { dim })
    }
}

fn check_scale(variation_scale: f64) -> Result<()> {
    if variation_scale.is_finite() && variation_scale > 0.0 {
        Ok(())
    } else {
        Err(GradientError::InvalidConfig(format!(
            "variation scale must be positive, got {}",
            variation_scale
        )))
    }
}
