//! Raw trained ensemble.
//!
//! A [`Booster`] is what the trainer produces and what the XGBoost exporter
//! consumes: a forest plus the metadata needed to interpret its output.
//! [`GBDTModel`](super::GBDTModel) wraps one together with its training
//! configuration.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use ndarray::{Array2, ArrayView2};

use crate::compat::xgboost::{XgbJsonError, XgbModel};
use crate::model::meta::ModelMeta;
use crate::repr::gbdt::Forest;
use crate::training::{Objective, ObjectiveFn};

/// Trained tree ensemble with its objective and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Booster {
    forest: Forest,
    meta: ModelMeta,
    objective: Objective,
}

impl Booster {
    pub fn new(forest: Forest, meta: ModelMeta, objective: Objective) -> Self {
        Self {
            forest,
            meta,
            objective,
        }
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn n_features(&self) -> usize {
        self.meta.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.forest.n_trees()
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.meta.feature_names.as_deref()
    }

    /// Set feature names.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.meta.feature_names = Some(names);
        self
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Raw margin scores with shape `[n_groups, n_samples]`.
    ///
    /// `features` is sample-major: `[n_samples, n_features]`.
    pub fn predict_raw(&self, features: ArrayView2<f32>) -> Array2<f32> {
        self.forest.predict(features)
    }

    /// Transformed predictions with shape `[n_groups, n_samples]`.
    ///
    /// Probabilities for `binary:logistic`, raw values otherwise.
    pub fn predict(&self, features: ArrayView2<f32>) -> Array2<f32> {
        let mut output = self.predict_raw(features);
        for row in output.rows_mut() {
            self.objective.transform_predictions_inplace(row);
        }
        output
    }

    // =========================================================================
    // XGBoost JSON
    // =========================================================================

    /// Build the XGBoost JSON document for this booster.
    pub fn to_xgb_model(&self) -> XgbModel {
        XgbModel::from_booster(self)
    }

    /// Write the booster as compact XGBoost JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), XgbJsonError> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, &self.to_xgb_model())?;
        writer.flush()?;
        tracing::debug!(path = %path.display(), n_trees = self.n_trees(), "wrote XGBoost JSON");
        Ok(())
    }

    /// Read a booster back from an XGBoost JSON model file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, XgbJsonError> {
        let reader = BufReader::new(File::open(path)?);
        let model: XgbModel = serde_json::from_reader(reader)?;
        Ok(model.to_booster()?)
    }
}
