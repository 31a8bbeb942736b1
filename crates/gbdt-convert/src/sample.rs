//! Sample review-interval model.
//!
//! Used when the converter runs without an input file: synthesizes a small
//! regression problem (days until the next review from quiz history), fits an
//! estimator on 80% of it and reports R² on both parts.

use ndarray::{Array1, Array2};
use rand::prelude::*;
use thiserror::Error;

use crate::data::{Dataset, DatasetError};
use crate::model::GBDTModel;
use crate::model::gbdt::{ConfigError, GBDTConfig, TreeParams};
use crate::training::Objective;
use crate::training::gbdt::TrainError;

/// Seed for data generation, splitting and training.
pub const SAMPLE_SEED: u64 = 42;

/// Number of synthesized rows.
pub const SAMPLE_ROWS: usize = 1000;

/// Fraction of rows held out for the test score.
pub const TEST_FRACTION: f64 = 0.2;

pub const FEATURE_NAMES: [&str; 4] = [
    "latest_score",
    "avg_score",
    "attempts_count",
    "days_since_last_attempt",
];

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("invalid sample data: {0}")]
    Dataset(#[from] DatasetError),

    #[error("invalid sample configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("training failed: {0}")]
    Train(#[from] TrainError),
}

/// Fitted sample estimator and its scores.
#[derive(Debug, Clone)]
pub struct SampleModel {
    pub model: GBDTModel,
    pub train_r2: f64,
    pub test_r2: f64,
}

/// Standard normal draw (Box-Muller).
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.r#gen::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.r#gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Synthesize `n_samples` rows of review data.
///
/// Columns are drawn one after another from a single RNG, then the noise.
/// The target is `1 + 2*latest + 1.5*avg + 0.5*attempts + N(0, 2)`, clipped
/// to `[1, 30]` and truncated to a whole number of days.
pub fn sample_dataset(n_samples: usize, seed: u64) -> Result<Dataset, DatasetError> {
    let mut rng = StdRng::seed_from_u64(seed);

    let latest: Vec<f64> = (0..n_samples).map(|_| rng.gen_range(0.0..10.0)).collect();
    let avg: Vec<f64> = (0..n_samples).map(|_| rng.gen_range(0.0..10.0)).collect();
    let attempts: Vec<i64> = (0..n_samples).map(|_| rng.gen_range(1..20)).collect();
    let days_since: Vec<i64> = (0..n_samples).map(|_| rng.gen_range(0..60)).collect();
    let noise: Vec<f64> = (0..n_samples).map(|_| 2.0 * standard_normal(&mut rng)).collect();

    let features = Array2::from_shape_fn((n_samples, FEATURE_NAMES.len()), |(row, col)| match col {
        0 => latest[row] as f32,
        1 => avg[row] as f32,
        2 => attempts[row] as f32,
        _ => days_since[row] as f32,
    });
    let targets: Array1<f32> = (0..n_samples)
        .map(|i| {
            let interval = 1.0 + 2.0 * latest[i] + 1.5 * avg[i] + 0.5 * attempts[i] as f64;
            (interval + noise[i]).clamp(1.0, 30.0).trunc() as f32
        })
        .collect();

    Dataset::new(features, targets)?.with_feature_names(FEATURE_NAMES.map(String::from).to_vec())
}

/// Hyperparameters of the sample regressor.
pub fn sample_config() -> Result<GBDTConfig, ConfigError> {
    GBDTConfig::builder()
        .objective(Objective::squared())
        .n_trees(100)
        .learning_rate(0.1)
        .tree(TreeParams::depth_wise(5))
        .seed(SAMPLE_SEED)
        .build()
}

/// Build, fit and score the sample model, printing both R² scores.
pub fn create_sample_model() -> Result<SampleModel, SampleError> {
    println!("Creating sample model for review prediction...");

    let dataset = sample_dataset(SAMPLE_ROWS, SAMPLE_SEED)?;
    let (train, test) = dataset.train_test_split(TEST_FRACTION, SAMPLE_SEED);
    tracing::debug!(
        train_rows = train.n_samples(),
        test_rows = test.n_samples(),
        "split sample data"
    );

    let model = GBDTModel::train(&train, sample_config()?)?;

    let train_r2 = model.score(&train);
    let test_r2 = model.score(&test);
    println!("Training R² score: {train_r2:.4}");
    println!("Test R² score: {test_r2:.4}");

    Ok(SampleModel {
        model,
        train_r2,
        test_r2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_columns_stay_in_range() {
        let ds = sample_dataset(500, SAMPLE_SEED).unwrap();
        assert_eq!(ds.n_samples(), 500);
        assert_eq!(ds.feature_names().unwrap(), FEATURE_NAMES.map(String::from).as_slice());

        let x = ds.features();
        for row in x.rows() {
            assert!((0.0..10.0).contains(&row[0]));
            assert!((0.0..10.0).contains(&row[1]));
            assert!((1.0..20.0).contains(&row[2]) && row[2].fract() == 0.0);
            assert!((0.0..60.0).contains(&row[3]) && row[3].fract() == 0.0);
        }
        for &y in ds.targets() {
            assert!((1.0..=30.0).contains(&y));
            assert_eq!(y.fract(), 0.0);
        }
    }

    #[test]
    fn dataset_is_deterministic() {
        assert_eq!(sample_dataset(100, 3).unwrap(), sample_dataset(100, 3).unwrap());
        assert_ne!(sample_dataset(100, 3).unwrap(), sample_dataset(100, 4).unwrap());
    }

    #[test]
    fn noise_has_roughly_unit_variance() {
        let mut rng = StdRng::seed_from_u64(0);
        let draws: Vec<f64> = (0..20_000).map(|_| standard_normal(&mut rng)).collect();
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        let var = draws.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / draws.len() as f64;
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var - 1.0).abs() < 0.05, "variance {var}");
    }

    #[test]
    fn sample_config_matches_regressor() {
        let config = sample_config().unwrap();
        assert_eq!(config.n_trees, 100);
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.tree.max_depth, 5);
        assert_eq!(config.seed, 42);
        assert_eq!(config.objective, Objective::squared());
    }

    #[test]
    fn sample_model_is_reproducible() {
        let first = create_sample_model().unwrap();
        let second = create_sample_model().unwrap();
        assert_eq!(first.train_r2, second.train_r2);
        assert_eq!(first.test_r2, second.test_r2);
        assert_eq!(first.model, second.model);

        assert_eq!(first.model.booster().n_trees(), 100);
        assert!(first.train_r2 > 0.5, "train R² {}", first.train_r2);
        assert!(first.train_r2 >= first.test_r2);
    }
}
