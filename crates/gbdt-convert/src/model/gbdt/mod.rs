//! GBDT model and configuration.
//!
//! This module provides the high-level [`GBDTModel`] estimator and nested
//! parameter structs for configuration.
//!
//! # Parameter Groups
//!
//! - [`TreeParams`]: Tree structure (max depth, histogram bins)
//! - [`RegularizationParams`]: L1/L2 regularization and split constraints
//! - [`SamplingParams`]: Row and column subsampling

mod config;
mod model;
mod params;

pub use config::{ConfigError, GBDTConfig};
pub use model::GBDTModel;
pub use params::{ParamValidationError, RegularizationParams, SamplingParams, TreeParams};
