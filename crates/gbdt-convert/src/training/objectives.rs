//! Objective (loss) functions for gradient boosting.
//!
//! ## Regression
//! - [`SquaredLoss`]: Standard squared error (L2 loss)
//!
//! ## Classification
//! - [`LogisticLoss`]: Binary classification (log loss / cross-entropy)
//!
//! Predictions passed to objectives are raw margins, one per row.

use ndarray::{ArrayView1, ArrayViewMut1};

use crate::model::TaskKind;
use crate::training::GradsTuple;

// =============================================================================
// Objective Trait
// =============================================================================

/// An objective (loss) function for training gradient boosted models.
pub trait ObjectiveFn {
    /// Write `(grad, hess)` for each row into `grad_hess`.
    fn compute_gradients_into(
        &self,
        predictions: ArrayView1<f32>,
        targets: ArrayView1<f32>,
        grad_hess: &mut [GradsTuple],
    );

    /// Optimal constant prediction (in margin space) before any trees are added.
    fn compute_base_score(&self, targets: ArrayView1<f32>) -> f32;

    /// Transform raw margins in place into semantic predictions.
    fn transform_predictions_inplace(&self, predictions: ArrayViewMut1<f32>);

    /// High-level task kind implied by this objective.
    fn task_kind(&self) -> TaskKind;

    /// Name of the objective (for logging).
    fn name(&self) -> &'static str;
}

// =============================================================================
// Squared loss
// =============================================================================

/// Squared error loss: `½(pred - target)²`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SquaredLoss;

impl ObjectiveFn for SquaredLoss {
    fn compute_gradients_into(
        &self,
        predictions: ArrayView1<f32>,
        targets: ArrayView1<f32>,
        grad_hess: &mut [GradsTuple],
    ) {
        debug_assert_eq!(predictions.len(), grad_hess.len());
        for ((pair, &pred), &target) in grad_hess.iter_mut().zip(predictions).zip(targets) {
            pair.grad = pred - target;
            pair.hess = 1.0;
        }
    }

    fn compute_base_score(&self, targets: ArrayView1<f32>) -> f32 {
        if targets.is_empty() {
            return 0.0;
        }
        let sum: f64 = targets.iter().map(|&y| y as f64).sum();
        (sum / targets.len() as f64) as f32
    }

    fn transform_predictions_inplace(&self, _predictions: ArrayViewMut1<f32>) {}

    fn task_kind(&self) -> TaskKind {
        TaskKind::Regression
    }

    fn name(&self) -> &'static str {
        "squared"
    }
}

// =============================================================================
// Logistic loss
// =============================================================================

/// Binary cross-entropy on sigmoid(margin). Targets are `{0, 1}`.
///
/// With `raw_output` set, predictions stay in margin space (XGBoost's
/// `binary:logitraw`); training is identical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogisticLoss {
    pub raw_output: bool,
}

impl LogisticLoss {
    const HESS_MIN: f32 = 1e-6;

    #[inline]
    pub fn sigmoid(x: f32) -> f32 {
        1.0 / (1.0 + (-x).exp())
    }
}

/// Probability to log-odds, clamped away from 0 and 1.
pub fn prob_to_margin(p: f64) -> f64 {
    let p = p.clamp(1e-7, 1.0 - 1e-7);
    (p / (1.0 - p)).ln()
}

impl ObjectiveFn for LogisticLoss {
    fn compute_gradients_into(
        &self,
        predictions: ArrayView1<f32>,
        targets: ArrayView1<f32>,
        grad_hess: &mut [GradsTuple],
    ) {
        debug_assert_eq!(predictions.len(), grad_hess.len());
        for ((pair, &pred), &target) in grad_hess.iter_mut().zip(predictions).zip(targets) {
            let p = Self::sigmoid(pred);
            pair.grad = p - target;
            pair.hess = (p * (1.0 - p)).max(Self::HESS_MIN);
        }
    }

    fn compute_base_score(&self, targets: ArrayView1<f32>) -> f32 {
        if targets.is_empty() {
            return 0.0;
        }
        let pos: f64 = targets.iter().map(|&y| y as f64).sum();
        prob_to_margin(pos / targets.len() as f64) as f32
    }

    fn transform_predictions_inplace(&self, mut predictions: ArrayViewMut1<f32>) {
        if !self.raw_output {
            predictions.mapv_inplace(Self::sigmoid);
        }
    }

    fn task_kind(&self) -> TaskKind {
        TaskKind::BinaryClassification
    }

    fn name(&self) -> &'static str {
        "logistic"
    }
}

// =============================================================================
// Objective Enum (Convenience wrapper)
// =============================================================================

/// Objective function enum for configuration and persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// Squared error loss (L2) for regression.
    SquaredLoss(SquaredLoss),
    /// Logistic loss for binary classification.
    LogisticLoss(LogisticLoss),
}

impl Objective {
    pub fn squared() -> Self {
        Self::SquaredLoss(SquaredLoss)
    }

    /// Binary logistic loss, predicting probabilities.
    pub fn logistic() -> Self {
        Self::LogisticLoss(LogisticLoss { raw_output: false })
    }

    /// Binary logistic loss, predicting raw margins.
    pub fn logit_raw() -> Self {
        Self::LogisticLoss(LogisticLoss { raw_output: true })
    }

    /// XGBoost objective name written on export.
    pub fn xgb_name(&self) -> &'static str {
        match self {
            Self::SquaredLoss(_) => "reg:squarederror",
            Self::LogisticLoss(LogisticLoss { raw_output: false }) => "binary:logistic",
            Self::LogisticLoss(LogisticLoss { raw_output: true }) => "binary:logitraw",
        }
    }

    /// Parse an XGBoost objective name. Legacy aliases are accepted.
    pub fn from_xgb_name(name: &str) -> Option<Self> {
        match name {
            "reg:squarederror" | "reg:linear" => Some(Self::squared()),
            "binary:logistic" | "reg:logistic" => Some(Self::logistic()),
            "binary:logitraw" => Some(Self::logit_raw()),
            _ => None,
        }
    }
}

impl Default for Objective {
    fn default() -> Self {
        Self::squared()
    }
}

impl ObjectiveFn for Objective {
    fn compute_gradients_into(
        &self,
        predictions: ArrayView1<f32>,
        targets: ArrayView1<f32>,
        grad_hess: &mut [GradsTuple],
    ) {
        match self {
            Self::SquaredLoss(inner) => inner.compute_gradients_into(predictions, targets, grad_hess),
            Self::LogisticLoss(inner) => inner.compute_gradients_into(predictions, targets, grad_hess),
        }
    }

    fn compute_base_score(&self, targets: ArrayView1<f32>) -> f32 {
        match self {
            Self::SquaredLoss(inner) => inner.compute_base_score(targets),
            Self::LogisticLoss(inner) => inner.compute_base_score(targets),
        }
    }

    fn transform_predictions_inplace(&self, predictions: ArrayViewMut1<f32>) {
        match self {
            Self::SquaredLoss(inner) => inner.transform_predictions_inplace(predictions),
            Self::LogisticLoss(inner) => inner.transform_predictions_inplace(predictions),
        }
    }

    fn task_kind(&self) -> TaskKind {
        match self {
            Self::SquaredLoss(inner) => inner.task_kind(),
            Self::LogisticLoss(inner) => inner.task_kind(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::SquaredLoss(inner) => inner.name(),
            Self::LogisticLoss(inner) => inner.name(),
        }
    }
}
