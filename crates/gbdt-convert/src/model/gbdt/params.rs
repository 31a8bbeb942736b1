//! Parameter groups nested inside [`GBDTConfig`](super::GBDTConfig).
//!
//! All three groups are persisted with estimators, hence the serde derives.

use serde::{Deserialize, Serialize};

use crate::data::binned::DEFAULT_MAX_BINS;

/// Out-of-range parameter in one of the groups.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamValidationError {
    #[error("lambda must be >= 0, got {0}")]
    InvalidLambda(f32),
    #[error("alpha must be >= 0, got {0}")]
    InvalidAlpha(f32),
    #[error("min_child_weight must be >= 0, got {0}")]
    InvalidMinChildWeight(f32),
    #[error("min_gain must be >= 0, got {0}")]
    InvalidMinGain(f32),
    #[error("subsample must be in (0, 1], got {0}")]
    InvalidSubsample(f32),
    #[error("colsample_bytree must be in (0, 1], got {0}")]
    InvalidColsampleBytree(f32),
    #[error("max_bins must be in [2, 256], got {0}")]
    InvalidMaxBins(usize),
}

fn non_negative(value: f32, err: fn(f32) -> ParamValidationError) -> Result<(), ParamValidationError> {
    if value >= 0.0 { Ok(()) } else { Err(err(value)) }
}

fn unit_ratio(value: f32, err: fn(f32) -> ParamValidationError) -> Result<(), ParamValidationError> {
    if value > 0.0 && value <= 1.0 { Ok(()) } else { Err(err(value)) }
}

/// Shape of each tree. Growth is always depth-wise.
///
/// ```
/// use gbdt_convert::model::gbdt::TreeParams;
///
/// let params = TreeParams::depth_wise(5).with_max_bins(64);
/// assert_eq!((params.max_depth, params.max_bins), (5, 64));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Root is depth 0. Default: 6.
    pub max_depth: u32,
    /// Histogram bins per feature. Default: 256.
    pub max_bins: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self::depth_wise(6)
    }
}

impl TreeParams {
    pub fn depth_wise(max_depth: u32) -> Self {
        Self {
            max_depth,
            max_bins: DEFAULT_MAX_BINS,
        }
    }

    pub fn with_max_bins(self, max_bins: usize) -> Self {
        Self { max_bins, ..self }
    }

    pub fn validate(&self) -> Result<(), ParamValidationError> {
        if (2..=DEFAULT_MAX_BINS).contains(&self.max_bins) {
            Ok(())
        } else {
            Err(ParamValidationError::InvalidMaxBins(self.max_bins))
        }
    }
}

/// Penalties and split constraints, named as in XGBoost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegularizationParams {
    /// L2 penalty on leaf weights. Default: 1.
    pub lambda: f32,
    /// L1 penalty on leaf weights. Default: 0.
    pub alpha: f32,
    /// Smallest hessian sum a child may have. Default: 1.
    pub min_child_weight: f32,
    /// Smallest gain worth splitting for (XGBoost's `gamma`). Default: 0.
    pub min_gain: f32,
}

impl Default for RegularizationParams {
    fn default() -> Self {
        Self {
            lambda: 1.0,
            alpha: 0.0,
            min_child_weight: 1.0,
            min_gain: 0.0,
        }
    }
}

impl RegularizationParams {
    pub fn validate(&self) -> Result<(), ParamValidationError> {
        non_negative(self.lambda, ParamValidationError::InvalidLambda)?;
        non_negative(self.alpha, ParamValidationError::InvalidAlpha)?;
        non_negative(self.min_child_weight, ParamValidationError::InvalidMinChildWeight)?;
        non_negative(self.min_gain, ParamValidationError::InvalidMinGain)
    }
}

/// Per-round row and per-tree column sampling. 1.0 disables either.
///
/// ```
/// use gbdt_convert::model::gbdt::SamplingParams;
///
/// let params = SamplingParams { subsample: 0.8, colsample_bytree: 0.8 };
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub subsample: f32,
    pub colsample_bytree: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            subsample: 1.0,
            colsample_bytree: 1.0,
        }
    }
}

impl SamplingParams {
    pub fn validate(&self) -> Result<(), ParamValidationError> {
        unit_ratio(self.subsample, ParamValidationError::InvalidSubsample)?;
        unit_ratio(self.colsample_bytree, ParamValidationError::InvalidColsampleBytree)
    }
}
