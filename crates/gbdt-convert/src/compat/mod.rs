//! Interoperability with other gradient boosting libraries.

pub mod xgboost;
