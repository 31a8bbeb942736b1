//! GBDT estimator.
//!
//! High-level wrapper around a [`Booster`] with training, prediction and
//! scoring. Access components via [`booster()`](GBDTModel::booster) and
//! [`config()`](GBDTModel::config).

use ndarray::{Array1, ArrayView2};

use crate::data::Dataset;
use crate::model::booster::Booster;
use crate::model::meta::{ModelMeta, TaskKind};
use crate::training::gbdt::{GBDTTrainer, TrainError};
use crate::training::{Metric, MetricFn, ObjectiveFn};

use super::GBDTConfig;

/// GBDT estimator: a trained booster plus the configuration it was fit with.
#[derive(Debug, Clone, PartialEq)]
pub struct GBDTModel {
    booster: Booster,
    config: GBDTConfig,
}

impl GBDTModel {
    /// Wrap a bare booster in an estimator with the default configuration.
    ///
    /// Used when loading raw boosters, which carry no hyperparameters.
    pub fn from_booster(booster: Booster) -> Self {
        Self {
            booster,
            config: GBDTConfig::default(),
        }
    }

    /// Create a model from all its parts.
    pub fn from_parts(booster: Booster, config: GBDTConfig) -> Self {
        Self { booster, config }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn booster(&self) -> &Booster {
        &self.booster
    }

    pub fn into_booster(self) -> Booster {
        self.booster
    }

    pub fn config(&self) -> &GBDTConfig {
        &self.config
    }

    pub fn meta(&self) -> &ModelMeta {
        self.booster.meta()
    }

    /// Train a new GBDT model.
    ///
    /// Feature names carried by `dataset` end up in the model metadata.
    pub fn train(dataset: &Dataset, config: GBDTConfig) -> Result<Self, TrainError> {
        let task = config.objective.task_kind();
        let metric = config.metric.unwrap_or(match task {
            TaskKind::Regression => Metric::rmse(),
            TaskKind::BinaryClassification => Metric::accuracy(),
        });

        let trainer = GBDTTrainer::new(config.objective, metric, config.to_trainer_params());
        let forest = trainer.train(dataset)?;

        let meta = ModelMeta {
            feature_names: dataset.feature_names().map(<[String]>::to_vec),
            n_features: dataset.n_features(),
            n_groups: task.n_groups(),
            task,
            base_scores: forest.base_score().to_vec(),
        };

        Ok(Self {
            booster: Booster::new(forest, meta, config.objective),
            config,
        })
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Predict for multiple rows, one value per row.
    ///
    /// Probabilities for classification, raw values for regression.
    /// `features` is sample-major: `[n_samples, n_features]`.
    pub fn predict(&self, features: ArrayView2<f32>) -> Array1<f32> {
        self.booster.predict(features).row(0).to_owned()
    }

    /// Raw margin scores, one per row.
    pub fn predict_raw(&self, features: ArrayView2<f32>) -> Array1<f32> {
        self.booster.predict_raw(features).row(0).to_owned()
    }

    /// Coefficient of determination for regression, accuracy for classification.
    pub fn score(&self, dataset: &Dataset) -> f64 {
        let preds = self.predict(dataset.features());
        let metric = match self.meta().task {
            TaskKind::Regression => Metric::r2(),
            TaskKind::BinaryClassification => Metric::accuracy(),
        };
        metric.compute(preds.view(), dataset.targets())
    }
}
