//! Training data.
//!
//! - [`Dataset`]: sample-major features `[n_samples, n_features]` plus targets
//! - [`binned`]: quantized features used by the histogram trainer
//!
//! Missing values are represented as `f32::NAN`.

pub mod binned;
mod dataset;

pub use binned::{BinMapper, BinnedMatrix};
pub use dataset::{Dataset, DatasetError, split_indices};
