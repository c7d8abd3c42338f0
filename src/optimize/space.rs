//! Bounded parameter spaces

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{GradientError, Result};

/// A domain that starting parameters are drawn from
pub trait ParameterSpace: std::fmt::Debug {
    /// Dimension of elements of this space
    fn dim(&self) -> usize;

    /// Sample an element uniformly within the space
    fn element(&mut self) -> DVector<f64>;

    /// Check whether `x` lies within the space
    fn contains(&self, x: &DVector<f64>) -> bool;
}

/// Axis-aligned box `[lower_i, upper_i]` per dimension
#[derive(Debug, Clone)]
pub struct BoundedSpace {
    lower: DVector<f64>,
    upper: DVector<f64>,
    rng: StdRng,
}

/// Serializable description of a [`BoundedSpace`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsConfig {
    /// Lower bound per dimension
    pub lower: Vec<f64>,
    /// Upper bound per dimension
    pub upper: Vec<f64>,
    /// Seed for sampling, entropy when absent
    pub seed: Option<u64>,
}

impl BoundedSpace {
    /// Create a box from per-dimension bounds
    pub fn new(lower: DVector<f64>, upper: DVector<f64>) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(GradientError::DimensionMismatch {
                expected: lower.len(),
                actual: upper.len(),
            });
        }
        if let Some(i) = (0..lower.len())
            .find(|&i| !(lower[i].is_finite() && upper[i].is_finite() && lower[i] <= upper[i]))
        {
            return Err(GradientError::InvalidConfig(format!(
                "bounds [{}, {}] of dimension {} are not a finite interval",
                lower[i], upper[i], i
            )));
        }
        Ok(Self { lower, upper, rng: StdRng::from_entropy() })
    }

    /// Unit box `[0, 1]^dim`
    pub fn unit(dim: usize) -> Self {
        Self {
            lower: DVector::zeros(dim),
            upper: DVector::from_element(dim, 1.0),
            rng: StdRng::from_entropy(),
        }
    }

    /// Same bounds `[low, high]` in every dimension
    pub fn uniform(dim: usize, low: f64, high: f64) -> Result<Self> {
        Self::new(DVector::from_element(dim, low), DVector::from_element(dim, high))
    }

    /// Build from a serialized description
    pub fn from_config(config: &BoundsConfig) -> Result<Self> {
        let space = Self::new(
            DVector::from_column_slice(&config.lower),
            DVector::from_column_slice(&config.upper),
        )?;
        Ok(match config.seed {
            Some(seed) => space.with_seed(seed),
            None => space,
        })
    }

    /// Make sampling reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Lower bounds
    pub fn lower(&self) -> &DVector<f64> {
        &self.lower
    }

    /// Upper bounds
    pub fn upper(&self) -> &DVector<f64> {
        &self.upper
    }
}

impl ParameterSpace for BoundedSpace {
    fn dim(&self) -> usize {
        self.lower.len()
    }

    fn element(&mut self) -> DVector<f64> {
        let rng = &mut self.rng;
        DVector::from_fn(self.lower.len(), |i, _| {
            self.lower[i] + rng.r#gen::<f64>() * (self.upper[i] - self.lower[i])
        })
    }

    fn contains(&self, x: &DVector<f64>) -> bool {
        x.len() == self.lower.len()
            && x.iter().zip(self.lower.iter().zip(self.upper.iter())).all(|(v, (lo, hi))| {
                lo <= v && v <= hi
            })
    }
}
