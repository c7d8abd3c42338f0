//! Linear dynamical system with quadratic cost
//!
//! A small deterministic benchmark whose expected reward is a known function
//! of a linear policy's parameter, which makes it suitable for checking
//! gradient estimates against analytic values.
//!
//! # Dynamics
//!
//! ```text
//! s' = A s + b a
//! r  = -||s'||^2
//! ```
//!
//! The episode starts from a fixed initial state, optionally perturbed by
//! seeded Gaussian noise, and never terminates on its own unless a step limit
//! is configured.

use anyhow::{Result, bail};
use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use super::{Environment, StepResult};

/// Linear system `s' = A s + b a` with reward `-||s'||^2`
#[derive(Debug, Clone)]
pub struct LinearSystem {
    transition: DMatrix<f64>,
    control: DVector<f64>,
    initial_state: DVector<f64>,
    state: DVector<f64>,

    // Episode tracking
    steps: usize,
    max_steps: Option<usize>,

    // Optional start-state noise
    init_noise: Option<Normal<f64>>,
    rng: StdRng,
}

impl LinearSystem {
    /// Create a system from its transition matrix, control vector and start state
    pub fn new(
        transition: DMatrix<f64>,
        control: DVector<f64>,
        initial_state: DVector<f64>,
    ) -> Result<Self> {
        let n = initial_state.len();
        if transition.nrows() != n || transition.ncols() != n {
            bail!(
                "transition matrix is {}x{}, state dimension is {}",
                transition.nrows(),
                transition.ncols(),
                n
            );
        }
        if control.len() != n {
            bail!("control vector has dimension {}, state dimension is {}", control.len(), n);
        }
        Ok(Self {
            transition,
            control,
            state: initial_state.clone(),
            initial_state,
            steps: 0,
            max_steps: None,
            init_noise: None,
            rng: StdRng::seed_from_u64(0),
        })
    }

    /// One-dimensional system `s' = a s + b u` starting at `s0`
    pub fn scalar(a: f64, b: f64, s0: f64) -> Self {
        let one = |v| DVector::from_element(1, v);
        Self {
            transition: DMatrix::from_element(1, 1, a),
            control: one(b),
            initial_state: one(s0),
            state: one(s0),
            steps: 0,
            max_steps: None,
            init_noise: None,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Terminate every episode after `max_steps` transitions
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Perturb the start state by `N(0, std^2)` per component, seeded
    pub fn with_initial_noise(mut self, std: f64, seed: u64) -> Result<Self> {
        self.init_noise = Some(Normal::new(0.0, std)?);
        self.rng = StdRng::seed_from_u64(seed);
        Ok(self)
    }

    /// State dimension
    pub fn state_dim(&self) -> usize {
        self.initial_state.len()
    }

    /// Current state
    pub fn state(&self) -> &DVector<f64> {
        &self.state
    }
}

impl Environment for LinearSystem {
    type Observation = DVector<f64>;
    type Action = f64;

    fn reset(&mut self) -> Result<DVector<f64>> {
        self.state = self.initial_state.clone();
        if let Some(noise) = &self.init_noise {
            for x in self.state.iter_mut() {
                *x += noise.sample(&mut self.rng);
            }
        }
        self.steps = 0;
        Ok(self.state.clone())
    }

    fn step(&mut self, action: f64) -> Result<StepResult<DVector<f64>>> {
        if !action.is_finite() {
            bail!("non-finite action {}", action);
        }

        self.state = &self.transition * &self.state + &self.control * action;
        self.steps += 1;

        let reward = -self.state.norm_squared();
        let terminated = self.max_steps.is_some_and(|max| self.steps >= max);

        Ok(StepResult { observation: self.state.clone(), reward, terminated, truncated: false })
    }
}
