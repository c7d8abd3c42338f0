//! Training algorithms
//!
//! This module implements gradient ascent on top of the estimators in
//! [`crate::estimate`].

pub mod ascent;

pub use ascent::{
    AscentConfig, AscentReport, AscentState, AscentStats, IterationStats, PolicyGradient,
};
