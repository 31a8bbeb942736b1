//! Dataset container and train/test splitting.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::prelude::*;

/// Errors raised when constructing a [`Dataset`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatasetError {
    #[error("targets have {targets} rows but features have {features}")]
    TargetLenMismatch { features: usize, targets: usize },
    #[error("{names} feature names for {features} features")]
    FeatureNamesMismatch { features: usize, names: usize },
    #[error("dataset has no rows")]
    Empty,
}

/// Features plus regression/classification targets.
///
/// # Storage Layout
///
/// Features are stored **sample-major**: `[n_samples, n_features]`, one row
/// per sample, matching the layout models predict on. Missing values are
/// `f32::NAN`.
///
/// # Example
///
/// ```
/// use gbdt_convert::data::Dataset;
/// use ndarray::array;
///
/// let features = array![[1.0, 4.0], [2.0, 5.0], [3.0, 6.0]];
/// let targets = array![0.0, 1.0, 0.0];
/// let ds = Dataset::new(features, targets).unwrap();
///
/// assert_eq!(ds.n_samples(), 3);
/// assert_eq!(ds.n_features(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Array2<f32>,
    targets: Array1<f32>,
    feature_names: Option<Vec<String>>,
}

impl Dataset {
    pub fn new(features: Array2<f32>, targets: Array1<f32>) -> Result<Self, DatasetError> {
        if features.nrows() != targets.len() {
            return Err(DatasetError::TargetLenMismatch {
                features: features.nrows(),
                targets: targets.len(),
            });
        }
        if features.nrows() == 0 {
            return Err(DatasetError::Empty);
        }
        Ok(Self {
            features,
            targets,
            feature_names: None,
        })
    }

    /// Attach feature names (one per column).
    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self, DatasetError> {
        if names.len() != self.n_features() {
            return Err(DatasetError::FeatureNamesMismatch {
                features: self.n_features(),
                names: names.len(),
            });
        }
        self.feature_names = Some(names);
        Ok(self)
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Feature matrix `[n_samples, n_features]`.
    pub fn features(&self) -> ArrayView2<'_, f32> {
        self.features.view()
    }

    pub fn targets(&self) -> ArrayView1<'_, f32> {
        self.targets.view()
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Copy out the given rows, in order. Feature names are kept.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            targets: self.targets.select(Axis(0), indices),
            feature_names: self.feature_names.clone(),
        }
    }

    /// Shuffled train/test split.
    ///
    /// The test part holds `ceil(test_fraction * n_samples)` rows. Returns
    /// `(train, test)`.
    pub fn train_test_split(&self, test_fraction: f64, seed: u64) -> (Self, Self) {
        let (train_idx, test_idx) = split_indices(self.n_samples(), test_fraction, seed);
        (self.select_rows(&train_idx), self.select_rows(&test_idx))
    }
}

/// Deterministic shuffled split of `0..rows`.
///
/// Returns `(train_idx, test_idx)`; the test side is taken from the front of
/// the shuffled order.
pub fn split_indices(rows: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    debug_assert!((0.0..1.0).contains(&test_fraction));
    let mut idx: Vec<usize> = (0..rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    idx.shuffle(&mut rng);

    let test_len = ((rows as f64) * test_fraction).ceil() as usize;
    let test_len = test_len.min(rows);
    let (test, train) = idx.split_at(test_len);
    (train.to_vec(), test.to_vec())
}
