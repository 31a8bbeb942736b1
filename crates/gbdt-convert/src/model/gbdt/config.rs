//! Estimator configuration.
//!
//! [`GBDTConfig`] groups the boosting knobs with the nested [`TreeParams`],
//! [`RegularizationParams`] and [`SamplingParams`]. The `bon` builder checks
//! everything in `build()`, so a config obtained from it is always trainable.
//!
//! ```
//! use gbdt_convert::model::gbdt::{GBDTConfig, SamplingParams, TreeParams};
//! use gbdt_convert::training::Objective;
//!
//! let review_model = GBDTConfig::builder()
//!     .n_trees(100)
//!     .learning_rate(0.1)
//!     .tree(TreeParams::depth_wise(5))
//!     .build()
//!     .unwrap();
//! assert_eq!(review_model.objective, Objective::squared());
//!
//! let classifier = GBDTConfig::builder()
//!     .objective(Objective::logistic())
//!     .sampling(SamplingParams { subsample: 0.5, colsample_bytree: 1.0 })
//!     .build();
//! assert!(classifier.is_ok());
//! ```

use bon::Builder;

use super::{ParamValidationError, RegularizationParams, SamplingParams, TreeParams};
use crate::training::{GBDTParams, GainParams, Metric, Objective, Verbosity};

/// Rejected configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `learning_rate` is zero, negative or NaN.
    InvalidLearningRate(f32),
    /// `n_trees` is zero.
    InvalidNTrees,
    /// One of the nested parameter groups is out of range.
    InvalidParam(ParamValidationError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLearningRate(v) => write!(f, "learning_rate must be > 0, got {v}"),
            Self::InvalidNTrees => f.write_str("at least one tree is required"),
            Self::InvalidParam(inner) => write!(f, "{inner}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidParam(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<ParamValidationError> for ConfigError {
    fn from(e: ParamValidationError) -> Self {
        Self::InvalidParam(e)
    }
}

/// Hyperparameters an estimator is trained with and persisted alongside.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
pub struct GBDTConfig {
    /// Default: squared error.
    #[builder(default)]
    pub objective: Objective,

    /// Metric for per-round logging. `None` picks one from the task.
    pub metric: Option<Metric>,

    /// Boosting rounds, one tree each. Default: 100.
    #[builder(default = 100)]
    pub n_trees: u32,

    /// Shrinkage applied to every leaf. Default: 0.3.
    #[builder(default = 0.3)]
    pub learning_rate: f32,

    #[builder(default)]
    pub tree: TreeParams,

    #[builder(default)]
    pub regularization: RegularizationParams,

    #[builder(default)]
    pub sampling: SamplingParams,

    /// Seeds row and column sampling. Default: 42.
    #[builder(default = 42)]
    pub seed: u64,

    #[builder(default)]
    pub verbosity: Verbosity,
}

impl<S: g_b_d_t_config_builder::IsComplete> GBDTConfigBuilder<S> {
    /// Finish the builder, rejecting out-of-range values.
    pub fn build(self) -> Result<GBDTConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl GBDTConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Written so NaN fails too.
        if !(self.learning_rate > 0.0) {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }
        if self.n_trees == 0 {
            return Err(ConfigError::InvalidNTrees);
        }
        self.tree.validate()?;
        self.regularization.validate()?;
        self.sampling.validate()?;
        Ok(())
    }

    /// Flat parameter set consumed by [`GBDTTrainer`](crate::training::GBDTTrainer).
    pub fn to_trainer_params(&self) -> GBDTParams {
        let reg = &self.regularization;
        GBDTParams {
            n_trees: self.n_trees,
            learning_rate: self.learning_rate,
            max_depth: self.tree.max_depth,
            max_bins: self.tree.max_bins,
            gain: GainParams {
                reg_lambda: reg.lambda,
                reg_alpha: reg.alpha,
                min_gain: reg.min_gain,
                min_child_weight: reg.min_child_weight,
            },
            subsample: self.sampling.subsample,
            colsample_bytree: self.sampling.colsample_bytree,
            verbosity: self.verbosity,
            seed: self.seed,
        }
    }
}

impl Default for GBDTConfig {
    fn default() -> Self {
        Self::builder().__build_internal()
    }
}
