//! Linear policy over a real-valued state
//!
//! The action is `theta[..n] . state + theta[n]`, i.e. a linear map of the
//! state plus a bias term, so the parameter dimension is `state_dim + 1`.
//!
//! With `noise_std > 0` the action is drawn from a Gaussian centred on the
//! linear output and the score function has the closed form
//!
//! ```text
//! grad log pi(a | s) = (a - mu(s)) / sigma^2 * [s, 1]
//! ```
//!
//! With `noise_std == 0` the policy is deterministic; its score is reported
//! as zero since a point mass has no density to differentiate.

use anyhow::{Result, bail, ensure};
use nalgebra::DVector;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use super::Policy;

/// Linear (optionally Gaussian) policy with a bias term
#[derive(Debug, Clone)]
pub struct LinearPolicy {
    parameter: DVector<f64>,
    noise_std: f64,
    rng: StdRng,
}

impl LinearPolicy {
    /// Deterministic policy for `state_dim`-dimensional states, zero parameter
    pub fn new(state_dim: usize) -> Self {
        Self {
            parameter: DVector::zeros(state_dim + 1),
            noise_std: 0.0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Gaussian policy with exploration noise and a fixed seed
    pub fn gaussian(state_dim: usize, noise_std: f64, seed: u64) -> Result<Self> {
        ensure!(noise_std.is_finite() && noise_std >= 0.0, "noise_std must be non-negative");
        Ok(Self {
            parameter: DVector::zeros(state_dim + 1),
            noise_std,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Start from a specific parameter instead of zero
    pub fn with_parameter(mut self, parameter: DVector<f64>) -> Result<Self> {
        self.set_parameter(parameter)?;
        Ok(self)
    }

    /// Standard deviation of the exploration noise
    pub fn noise_std(&self) -> f64 {
        self.noise_std
    }

    /// Whether actions are a deterministic function of the state
    pub fn is_deterministic(&self) -> bool {
        self.noise_std == 0.0
    }

    /// Dimension of the states this policy accepts
    pub fn state_dim(&self) -> usize {
        self.parameter.len() - 1
    }

    /// Noise-free action `mu(s)`
    pub fn mean_action(&self, state: &DVector<f64>) -> Result<f64> {
        let n = self.state_dim();
        if state.len() != n {
            bail!("state has dimension {}, policy expects {}", state.len(), n);
        }
        Ok(self.parameter.rows(0, n).dot(state) + self.parameter[n])
    }

    fn features(state: &DVector<f64>) -> DVector<f64> {
        let n = state.len();
        DVector::from_fn(n + 1, |i, _| if i < n { state[i] } else { 1.0 })
    }
}

impl Policy for LinearPolicy {
    type State = DVector<f64>;
    type Action = f64;

    fn parameter(&self) -> &DVector<f64> {
        &self.parameter
    }

    fn set_parameter(&mut self, parameter: DVector<f64>) -> Result<()> {
        if parameter.len() != self.parameter.len() {
            bail!(
                "parameter has dimension {}, policy expects {}",
                parameter.len(),
                self.parameter.len()
            );
        }
        self.parameter = parameter;
        Ok(())
    }

    fn parameter_shape(&self) -> usize {
        self.parameter.len()
    }

    fn act(&mut self, state: &DVector<f64>) -> Result<f64> {
        let mean = self.mean_action(state)?;
        if self.is_deterministic() {
            return Ok(mean);
        }
        let normal = Normal::new(mean, self.noise_std)?;
        Ok(normal.sample(&mut self.rng))
    }

    fn log_grad(&self, state: &DVector<f64>, action: &f64) -> Result<DVector<f64>> {
        let mean = self.mean_action(state)?;
        if self.is_deterministic() {
            return Ok(DVector::zeros(self.parameter.len()));
        }
        let scale = (action - mean) / (self.noise_std * self.noise_std);
        Ok(Self::features(state) * scale)
    }
}
