//! High-level model wrappers.
//!
//! - [`Booster`]: Trained forest with its objective and metadata
//! - [`GBDTModel`]: Estimator pairing a booster with its training configuration
//! - [`ModelMeta`]: Shared metadata
//!
//! # Example
//!
//! ```
//! use gbdt_convert::model::GBDTModel;
//! use gbdt_convert::model::gbdt::GBDTConfig;
//! use gbdt_convert::Dataset;
//! use ndarray::array;
//!
//! let data = Dataset::new(array![[1.0f32], [2.0], [3.0], [4.0]], array![1.0f32, 1.0, 5.0, 5.0]).unwrap();
//! let config = GBDTConfig::builder()
//!     .n_trees(10)
//!     .learning_rate(0.5)
//!     .build()
//!     .unwrap();
//! let model = GBDTModel::train(&data, config).unwrap();
//! let predictions = model.predict(data.features());
//! assert_eq!(predictions.len(), 4);
//! ```

mod booster;
pub mod gbdt;
mod meta;

pub use booster::Booster;
pub use gbdt::GBDTModel;
pub use meta::{ModelMeta, TaskKind};
