//! Canonical model representations shared by training, inference and the
//! persistence formats.

pub mod gbdt;
