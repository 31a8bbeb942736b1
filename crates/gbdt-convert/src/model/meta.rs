//! Shape and provenance of a trained model.

use serde::{Deserialize, Serialize};

/// What the model's output means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskKind {
    /// Real-valued output, e.g. days until the next review.
    #[default]
    Regression,
    /// Probability of the positive class.
    BinaryClassification,
}

impl TaskKind {
    /// Output groups (one tree per group per round). Both tasks are scalar.
    pub fn n_groups(&self) -> usize {
        1
    }

    pub fn is_classification(&self) -> bool {
        *self == Self::BinaryClassification
    }
}

/// Facts about a model that its trees alone don't carry.
///
/// `n_features` is the width of the training matrix, which can exceed the
/// largest split index when trailing columns were never used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    pub feature_names: Option<Vec<String>>,
    pub n_features: usize,
    pub n_groups: usize,
    pub task: TaskKind,
    /// Starting margin per group.
    pub base_scores: Vec<f32>,
}

impl ModelMeta {
    /// Regression over `n_features` columns, base score 0.5 as in XGBoost.
    pub fn for_regression(n_features: usize) -> Self {
        Self {
            n_features,
            n_groups: 1,
            task: TaskKind::Regression,
            base_scores: vec![0.5],
            feature_names: None,
        }
    }

    pub fn with_feature_names(self, names: Vec<String>) -> Self {
        Self {
            feature_names: Some(names),
            ..self
        }
    }

    pub fn with_base_scores(self, base_scores: Vec<f32>) -> Self {
        Self { base_scores, ..self }
    }
}
