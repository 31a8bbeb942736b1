//! Training infrastructure for gradient boosting.
//!
//! ## Shared Infrastructure
//!
//! - [`GradsTuple`], [`Gradients`]: Per-row gradient storage
//! - [`ObjectiveFn`] / [`Objective`]: Loss functions computing gradients
//! - [`MetricFn`] / [`Metric`]: Evaluation metrics
//! - [`TrainingLogger`], [`Verbosity`]: Structured logging
//!
//! ## Model-Specific Training
//!
//! - [`gbdt`]: GBDT (decision tree) training with a histogram-based approach

pub mod gbdt;
mod gradients;
mod logger;
mod metrics;
mod objectives;

pub use gradients::{GradsTuple, Gradients};
pub use logger::{TrainingLogger, Verbosity};
pub use metrics::{Accuracy, Mae, Metric, MetricFn, R2, Rmse};
pub use objectives::{LogisticLoss, Objective, ObjectiveFn, SquaredLoss, prob_to_margin};

pub use gbdt::{GBDTParams, GBDTTrainer, GainParams, TrainError};
