//! Parameter spaces for initializing gradient ascent
//!
//! The ascent driver samples starting parameters from a [`ParameterSpace`]
//! until it finds one where the estimated gradient is not flat.
//!
//! # Example
//!
//! ```rust
//! use thrust_pg::optimize::{BoundedSpace, ParameterSpace};
//!
//! let mut space = BoundedSpace::unit(3).with_seed(7);
//! let theta = space.element();
//! assert!(space.contains(&theta));
//! ```

pub mod space;

pub use space::{BoundedSpace, BoundsConfig, ParameterSpace};
