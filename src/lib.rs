//! # Issue Classifier
//!
//! Sorts GitHub issues into areas with a bag-of-n-grams featurizer and a maximum entropy
//! classifier trained on `burn`.
#![forbid(unsafe_code)]

/// Errors
pub mod error;

/// Models
pub mod models;

/// Pipelines
pub mod pipelines;

/// Datasets
pub mod datasets;

/// The end to end experiment
pub mod session;

/// Utilities
pub mod utils;

pub use error::{Error, Result};
