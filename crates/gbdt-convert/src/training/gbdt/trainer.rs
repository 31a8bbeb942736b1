//! GBDT Trainer for gradient boosting.
//!
//! Orchestrates objective computation, tree growing, and prediction updates.
//! Use [`GBDTTrainer::train`] to train a forest from a [`Dataset`].

use ndarray::Array1;
use rand::prelude::*;
use rand::seq::index;

use crate::data::{BinnedMatrix, Dataset};
use crate::repr::gbdt::Forest;
use crate::training::logger::TrainingLogger;
use crate::training::metrics::MetricFn;
use crate::training::objectives::ObjectiveFn;
use crate::training::{Gradients, Verbosity};

use super::gain::GainParams;
use super::grower::{GrowerParams, TreeGrower};
use crate::data::binned::DEFAULT_MAX_BINS;

// =============================================================================
// GBDTParams
// =============================================================================

/// Parameters for GBDT training.
#[derive(Clone, Debug, PartialEq)]
pub struct GBDTParams {
    // --- Boosting parameters ---
    /// Number of boosting rounds (trees to train).
    pub n_trees: u32,
    /// Learning rate (shrinkage).
    pub learning_rate: f32,

    // --- Tree structure ---
    /// Maximum tree depth (root has depth 0).
    pub max_depth: u32,
    /// Maximum histogram bins per feature.
    pub max_bins: usize,

    // --- Regularization (encapsulated in GainParams) ---
    pub gain: GainParams,

    // --- Sampling ---
    /// Fraction of rows drawn for each tree.
    pub subsample: f32,
    /// Fraction of features drawn for each tree.
    pub colsample_bytree: f32,

    // --- Logging ---
    pub verbosity: Verbosity,

    // --- Reproducibility ---
    pub seed: u64,
}

impl Default for GBDTParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            learning_rate: 0.3,
            max_depth: 6,
            max_bins: DEFAULT_MAX_BINS,
            gain: GainParams::default(),
            subsample: 1.0,
            colsample_bytree: 1.0,
            verbosity: Verbosity::default(),
            seed: 42,
        }
    }
}

impl GBDTParams {
    fn to_grower_params(&self) -> GrowerParams {
        GrowerParams {
            gain: self.gain.clone(),
            learning_rate: self.learning_rate,
            max_depth: self.max_depth,
        }
    }
}

/// Errors raised before training starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrainError {
    #[error("dataset has no features")]
    NoFeatures,
    #[error("target at row {row} is not finite")]
    NonFiniteTarget { row: usize },
    #[error("target {value} at row {row} is outside [0, 1] required by the {objective} objective")]
    TargetOutOfRange {
        row: usize,
        value: f32,
        objective: &'static str,
    },
}

// =============================================================================
// GBDTTrainer
// =============================================================================

/// GBDT Trainer.
pub struct GBDTTrainer<O: ObjectiveFn, M: MetricFn> {
    objective: O,
    /// Metric logged each round at `Verbosity::Info`.
    metric: M,
    params: GBDTParams,
}

impl<O: ObjectiveFn, M: MetricFn> GBDTTrainer<O, M> {
    pub fn new(objective: O, metric: M, params: GBDTParams) -> Self {
        Self {
            objective,
            metric,
            params,
        }
    }

    pub fn params(&self) -> &GBDTParams {
        &self.params
    }

    /// Train a single-output forest.
    pub fn train(&self, dataset: &Dataset) -> Result<Forest, TrainError> {
        self.validate_inputs(dataset)?;

        let features = dataset.features();
        let targets = dataset.targets();
        let n_rows = dataset.n_samples();
        let n_features = dataset.n_features();

        let binned = BinnedMatrix::from_features(features, self.params.max_bins);
        let grower = TreeGrower::new(&binned, self.params.to_grower_params());

        let base_score = self.objective.compute_base_score(targets);
        let mut forest = Forest::for_regression().with_base_score(vec![base_score]);
        let mut predictions = Array1::from_elem(n_rows, base_score);
        let mut gradients = Gradients::new(n_rows);
        let mut rng = StdRng::seed_from_u64(self.params.seed);

        let all_rows: Vec<u32> = (0..n_rows as u32).collect();
        let all_features: Vec<usize> = (0..n_features).collect();

        let mut logger = TrainingLogger::new(self.params.verbosity);
        logger.start_training(self.params.n_trees as usize, n_rows, n_features);

        for round in 0..self.params.n_trees as usize {
            self.objective
                .compute_gradients_into(predictions.view(), targets, gradients.pairs_mut());

            let rows = sample_subset(&mut rng, n_rows, self.params.subsample)
                .map(|idx| idx.into_iter().map(|i| i as u32).collect::<Vec<_>>());
            let cols = sample_subset(&mut rng, n_features, self.params.colsample_bytree);

            let tree = grower
                .grow(
                    &gradients,
                    rows.as_deref().unwrap_or(&all_rows),
                    cols.as_deref().unwrap_or(&all_features),
                )
                .freeze();

            // Sampled-out rows still need this tree's contribution.
            for (row, pred) in features.rows().into_iter().zip(predictions.iter_mut()) {
                *pred += tree.predict_row(row);
            }

            if tree.n_nodes() == 1 {
                logger.warn_stump(round);
            }
            logger.log_tree(round, tree.n_nodes(), tree.depth());
            if logger.verbosity() >= Verbosity::Info {
                let mut transformed = predictions.clone();
                self.objective.transform_predictions_inplace(transformed.view_mut());
                let value = self.metric.compute(transformed.view(), targets);
                logger.log_metrics(round, self.metric.name(), value);
            }

            forest.push_tree(tree, 0);
        }

        logger.finish_training(forest.n_trees());
        Ok(forest)
    }

    fn validate_inputs(&self, dataset: &Dataset) -> Result<(), TrainError> {
        if dataset.n_features() == 0 {
            return Err(TrainError::NoFeatures);
        }
        let binary = self.objective.task_kind().is_classification();
        for (row, &value) in dataset.targets().iter().enumerate() {
            if !value.is_finite() {
                return Err(TrainError::NonFiniteTarget { row });
            }
            if binary && !(0.0..=1.0).contains(&value) {
                return Err(TrainError::TargetOutOfRange {
                    row,
                    value,
                    objective: self.objective.name(),
                });
            }
        }
        Ok(())
    }
}

/// Sorted random subset of `0..n` of size `round(n * fraction)` (at least 1).
///
/// Returns `None` when `fraction >= 1`, meaning "use everything".
fn sample_subset(rng: &mut StdRng, n: usize, fraction: f32) -> Option<Vec<usize>> {
    if fraction >= 1.0 || n == 0 {
        return None;
    }
    let amount = ((n as f64 * fraction as f64).round() as usize).clamp(1, n);
    let mut picked = index::sample(rng, n, amount).into_vec();
    picked.sort_unstable();
    Some(picked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{linear_targets, random_features};
    use crate::training::metrics::Rmse;
    use crate::training::objectives::{LogisticLoss, SquaredLoss};
    use ndarray::{Array2, array};

    fn regression_dataset() -> Dataset {
        let features = random_features(200, 3, 1, 0.0, 10.0);
        let targets = linear_targets(&features, 2, 0.1);
        Dataset::new(features, targets).unwrap()
    }

    #[test]
    fn test_params_default() {
        let params = GBDTParams::default();
        assert_eq!(params.n_trees, 100);
        assert!((params.learning_rate - 0.3).abs() < 1e-6);
        assert_eq!(params.max_depth, 6);
        assert!((params.gain.reg_lambda - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_train_multiple_trees() {
        let ds = regression_dataset();
        let params = GBDTParams {
            n_trees: 10,
            learning_rate: 0.1,
            ..Default::default()
        };
        let forest = GBDTTrainer::new(SquaredLoss, Rmse, params).train(&ds).unwrap();
        assert_eq!(forest.n_trees(), 10);
        assert_eq!(forest.n_groups(), 1);
        assert!(forest.validate().is_ok());
    }

    #[test]
    fn training_reduces_rmse_below_base_score() {
        let ds = regression_dataset();
        let params = GBDTParams {
            n_trees: 30,
            max_depth: 4,
            ..Default::default()
        };
        let forest = GBDTTrainer::new(SquaredLoss, Rmse, params).train(&ds).unwrap();

        let base = Array1::from_elem(ds.n_samples(), forest.base_score()[0]);
        let preds = forest.predict(ds.features()).row(0).to_owned();
        let base_rmse = Rmse.compute(base.view(), ds.targets());
        let trained_rmse = Rmse.compute(preds.view(), ds.targets());
        assert!(trained_rmse < base_rmse * 0.5, "{trained_rmse} vs {base_rmse}");
    }

    #[test]
    fn same_seed_same_forest_with_sampling() {
        let ds = regression_dataset();
        let params = GBDTParams {
            n_trees: 5,
            subsample: 0.7,
            colsample_bytree: 0.67,
            seed: 9,
            ..Default::default()
        };
        let a = GBDTTrainer::new(SquaredLoss, Rmse, params.clone()).train(&ds).unwrap();
        let b = GBDTTrainer::new(SquaredLoss, Rmse, params).train(&ds).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn logistic_rejects_non_binary_targets() {
        let ds = Dataset::new(array![[1.0f32], [2.0]], array![0.0f32, 2.0]).unwrap();
        let err = GBDTTrainer::new(LogisticLoss::default(), Rmse, GBDTParams::default())
            .train(&ds)
            .unwrap_err();
        assert!(matches!(err, TrainError::TargetOutOfRange { row: 1, .. }));
    }

    #[test]
    fn rejects_non_finite_targets() {
        let ds = Dataset::new(Array2::zeros((2, 1)), array![1.0f32, f32::NAN]).unwrap();
        let err = GBDTTrainer::new(SquaredLoss, Rmse, GBDTParams::default())
            .train(&ds)
            .unwrap_err();
        assert_eq!(err, TrainError::NonFiniteTarget { row: 1 });
    }
}
