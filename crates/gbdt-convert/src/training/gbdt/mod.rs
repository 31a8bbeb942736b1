//! Histogram-based GBDT training.
//!
//! - [`gain`]: split gain and leaf weights
//! - [`histogram`]: per-node gradient histograms
//! - [`grower`]: depth-wise tree growth
//! - [`trainer`]: the boosting loop

pub mod gain;
pub mod grower;
pub mod histogram;
mod trainer;

pub use gain::GainParams;
pub use grower::{GrowerParams, TreeGrower};
pub use trainer::{GBDTParams, GBDTTrainer, TrainError};
