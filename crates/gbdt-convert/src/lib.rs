//! gbdt-convert: gradient-boosted tree models and XGBoost JSON export.
//!
//! A small, self-contained gradient boosting library whose main job is to
//! turn a persisted model into the XGBoost JSON model format.
//!
//! # Key Types
//!
//! - [`GBDTModel`] - Estimator with train/predict/score, wrapping a [`Booster`]
//! - [`GBDTConfig`] - Configuration builder
//! - [`Objective`] / [`Metric`] - Training objectives and evaluation metrics
//! - [`Dataset`] - Feature matrix and targets
//!
//! # Persistence
//!
//! Models are stored in a compact binary container (see [`io`]) that holds
//! either a full estimator or a raw booster. [`io::load_model`] accepts both
//! and always returns an estimator.
//!
//! # XGBoost JSON
//!
//! [`Booster::save_json`] writes XGBoost's JSON model format and
//! [`Booster::load_json`] reads it back. The [`convert`] module wraps export
//! in the pretty-printing pipeline used by the `convert-model` binary.

// Re-export approx traits for users who want to compare predictions
pub use approx;

pub mod cli;
pub mod compat;
pub mod convert;
pub mod data;
pub mod io;
pub mod model;
pub mod repr;
pub mod sample;
pub mod testing;
pub mod training;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use model::{Booster, GBDTModel, ModelMeta, TaskKind};

pub use model::gbdt::GBDTConfig;

pub use training::{Metric, MetricFn, Objective, ObjectiveFn};

pub use data::Dataset;
