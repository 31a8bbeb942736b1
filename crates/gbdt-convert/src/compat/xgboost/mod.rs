//! XGBoost JSON model format support.
//!
//! - [`json`]: serde schema of the document
//! - import: [`XgbModel::to_booster`]
//! - export: [`XgbModel::from_booster`]

mod convert;
mod export;
pub mod json;

pub use convert::ConversionError;
pub use export::{ROOT_PARENT, XGBOOST_VERSION};
pub use json::{XgbJsonError, XgbModel};
