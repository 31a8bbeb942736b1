//! Gradient-boosted decision tree (GBDT) canonical representations.

/// Canonical node identifier used by the GBDT representation.
///
/// Internally this is just an index into the tree's SoA arrays.
pub type NodeId = u32;

pub mod forest;
pub mod mutable_tree;
pub mod tree;

pub use forest::{Forest, ForestValidationError};
pub use mutable_tree::MutableTree;
pub use tree::{Tree, TreeValidationError};
