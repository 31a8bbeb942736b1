//! Evaluation metrics for model quality.
//!
//! Metrics are separate from loss functions: a model might be trained with
//! one loss but evaluated with different metrics. Predictions passed to a
//! metric are already transformed (values for regression, probabilities for
//! binary classification).
//!
//! ## Regression
//! - [`Rmse`]: Root Mean Squared Error
//! - [`Mae`]: Mean Absolute Error
//! - [`R2`]: Coefficient of determination
//!
//! ## Classification
//! - [`Accuracy`]: Binary classification accuracy at a 0.5 threshold

use ndarray::ArrayView1;

/// A metric over one prediction per row.
pub trait MetricFn {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f64;

    /// Whether larger values are better.
    fn higher_is_better(&self) -> bool;

    fn name(&self) -> &'static str;
}

fn pairs<'a, 'b>(
    predictions: ArrayView1<'a, f32>,
    targets: ArrayView1<'b, f32>,
) -> impl Iterator<Item = (f64, f64)> + use<'a, 'b> {
    predictions
        .into_iter()
        .zip(targets)
        .map(|(&p, &y)| (p as f64, y as f64))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rmse;

impl MetricFn for Rmse {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f64 {
        let n = predictions.len();
        if n == 0 {
            return 0.0;
        }
        let sum_sq: f64 = pairs(predictions, targets).map(|(p, y)| (p - y) * (p - y)).sum();
        (sum_sq / n as f64).sqrt()
    }

    fn higher_is_better(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "rmse"
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mae;

impl MetricFn for Mae {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f64 {
        let n = predictions.len();
        if n == 0 {
            return 0.0;
        }
        let sum_abs: f64 = pairs(predictions, targets).map(|(p, y)| (p - y).abs()).sum();
        sum_abs / n as f64
    }

    fn higher_is_better(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "mae"
    }
}

/// `1 - SS_res / SS_tot`.
///
/// When the targets are constant, returns 1.0 for a perfect fit and 0.0
/// otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct R2;

impl MetricFn for R2 {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f64 {
        let n = targets.len();
        if n == 0 {
            return 0.0;
        }
        let mean = targets.iter().map(|&y| y as f64).sum::<f64>() / n as f64;
        let ss_tot: f64 = targets.iter().map(|&y| (y as f64 - mean).powi(2)).sum();
        let ss_res: f64 = pairs(predictions, targets).map(|(p, y)| (y - p).powi(2)).sum();

        if ss_tot == 0.0 {
            return if ss_res == 0.0 { 1.0 } else { 0.0 };
        }
        1.0 - ss_res / ss_tot
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "r2"
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accuracy;

impl MetricFn for Accuracy {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f64 {
        let n = predictions.len();
        if n == 0 {
            return 0.0;
        }
        let correct = pairs(predictions, targets)
            .filter(|&(p, y)| (p >= 0.5) == (y >= 0.5))
            .count();
        correct as f64 / n as f64
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "accuracy"
    }
}

/// Metric enum for configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Rmse(Rmse),
    Mae(Mae),
    R2(R2),
    Accuracy(Accuracy),
}

impl Metric {
    pub fn rmse() -> Self {
        Self::Rmse(Rmse)
    }

    pub fn mae() -> Self {
        Self::Mae(Mae)
    }

    pub fn r2() -> Self {
        Self::R2(R2)
    }

    pub fn accuracy() -> Self {
        Self::Accuracy(Accuracy)
    }

    /// Inverse of [`MetricFn::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rmse" => Some(Self::rmse()),
            "mae" => Some(Self::mae()),
            "r2" => Some(Self::r2()),
            "accuracy" => Some(Self::accuracy()),
            _ => None,
        }
    }
}

impl MetricFn for Metric {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f64 {
        match self {
            Self::Rmse(inner) => inner.compute(predictions, targets),
            Self::Mae(inner) => inner.compute(predictions, targets),
            Self::R2(inner) => inner.compute(predictions, targets),
            Self::Accuracy(inner) => inner.compute(predictions, targets),
        }
    }

    fn higher_is_better(&self) -> bool {
        match self {
            Self::Rmse(inner) => inner.higher_is_better(),
            Self::Mae(inner) => inner.higher_is_better(),
            Self::R2(inner) => inner.higher_is_better(),
            Self::Accuracy(inner) => inner.higher_is_better(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Rmse(inner) => inner.name(),
            Self::Mae(inner) => inner.name(),
            Self::R2(inner) => inner.name(),
            Self::Accuracy(inner) => inner.name(),
        }
    }
}
