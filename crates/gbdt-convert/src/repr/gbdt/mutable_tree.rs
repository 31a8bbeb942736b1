//! Mutable tree construction.
//!
//! [`MutableTree`] is used in two ways:
//! - the trainer grows it incrementally with [`MutableTree::apply_numeric_split`]
//!   (children are allocated in expansion order, so depth-wise growth yields
//!   breadth-first node ids);
//! - importers pre-size it with [`MutableTree::init_root_with_n_nodes`] and fill
//!   nodes with explicit child indices.

use super::{NodeId, Tree};

/// Mutable tree builder.
#[derive(Clone, Debug, Default)]
pub struct MutableTree {
    split_indices: Vec<u32>,
    split_thresholds: Vec<f32>,
    left_children: Vec<u32>,
    right_children: Vec<u32>,
    default_left: Vec<bool>,
    is_leaf: Vec<bool>,
    values: Vec<f32>,
    gains: Vec<f32>,
    covers: Vec<f32>,
}

impl MutableTree {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with capacity hint.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            split_indices: Vec::with_capacity(capacity),
            split_thresholds: Vec::with_capacity(capacity),
            left_children: Vec::with_capacity(capacity),
            right_children: Vec::with_capacity(capacity),
            default_left: Vec::with_capacity(capacity),
            is_leaf: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            gains: Vec::with_capacity(capacity),
            covers: Vec::with_capacity(capacity),
        }
    }

    /// Reset and allocate the root as a placeholder leaf.
    ///
    /// Returns the root node ID (always 0).
    pub fn init_root(&mut self) -> NodeId {
        self.init_root_with_n_nodes(1);
        0
    }

    /// Reset and allocate `n_nodes` placeholder leaves.
    pub fn init_root_with_n_nodes(&mut self, n_nodes: usize) {
        self.clear();
        for _ in 0..n_nodes {
            self.push_placeholder();
        }
    }

    /// Number of allocated nodes.
    pub fn n_nodes(&self) -> usize {
        self.is_leaf.len()
    }

    /// Turn `node` into a numeric split and allocate its two children.
    ///
    /// `weight` is the node's own (scaled) weight, kept for export. Returns
    /// `(left_id, right_id)`.
    pub fn apply_numeric_split(
        &mut self,
        node: NodeId,
        feature: u32,
        threshold: f32,
        default_left: bool,
        gain: f32,
        weight: f32,
    ) -> (NodeId, NodeId) {
        let left = self.push_placeholder();
        let right = self.push_placeholder();
        self.set_numeric_split(node, feature, threshold, default_left, left, right);
        let idx = node as usize;
        self.gains[idx] = gain;
        self.values[idx] = weight;
        (left, right)
    }

    /// Set a numeric split with explicit child indices.
    pub fn set_numeric_split(
        &mut self,
        node: NodeId,
        feature: u32,
        threshold: f32,
        default_left: bool,
        left: NodeId,
        right: NodeId,
    ) {
        let idx = node as usize;
        self.is_leaf[idx] = false;
        self.split_indices[idx] = feature;
        self.split_thresholds[idx] = threshold;
        self.default_left[idx] = default_left;
        self.left_children[idx] = left;
        self.right_children[idx] = right;
    }

    /// Set a node as a leaf with the given value.
    pub fn make_leaf(&mut self, node: NodeId, value: f32) {
        let idx = node as usize;
        self.is_leaf[idx] = true;
        self.values[idx] = value;
        self.split_indices[idx] = 0;
        self.split_thresholds[idx] = 0.0;
        self.left_children[idx] = 0;
        self.right_children[idx] = 0;
        self.default_left[idx] = false;
        self.gains[idx] = 0.0;
    }

    /// Overwrite the stored value of any node (leaf output or split weight).
    pub fn set_value(&mut self, node: NodeId, value: f32) {
        self.values[node as usize] = value;
    }

    /// Record gain and cover for a node.
    pub fn set_stats(&mut self, node: NodeId, gain: f32, cover: f32) {
        let idx = node as usize;
        self.gains[idx] = gain;
        self.covers[idx] = cover;
    }

    /// Record the cover (hessian sum) for a node.
    pub fn set_cover(&mut self, node: NodeId, cover: f32) {
        self.covers[node as usize] = cover;
    }

    /// Freeze into an immutable [`Tree`], carrying gains and covers.
    pub fn freeze(self) -> Tree {
        Tree::new(
            self.split_indices,
            self.split_thresholds,
            self.left_children,
            self.right_children,
            self.default_left,
            self.is_leaf,
            self.values,
        )
        .with_stats(self.gains, self.covers)
    }

    fn clear(&mut self) {
        self.split_indices.clear();
        self.split_thresholds.clear();
        self.left_children.clear();
        self.right_children.clear();
        self.default_left.clear();
        self.is_leaf.clear();
        self.values.clear();
        self.gains.clear();
        self.covers.clear();
    }

    fn push_placeholder(&mut self) -> NodeId {
        let id = self.is_leaf.len() as NodeId;
        self.split_indices.push(0);
        self.split_thresholds.push(0.0);
        self.left_children.push(0);
        self.right_children.push(0);
        self.default_left.push(false);
        self.is_leaf.push(true);
        self.values.push(0.0);
        self.gains.push(0.0);
        self.covers.push(0.0);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn grows_breadth_first_ids() {
        let mut tree = MutableTree::new();
        let root = tree.init_root();
        let (l, r) = tree.apply_numeric_split(root, 0, 0.5, true, 3.0, 0.1);
        assert_eq!((l, r), (1, 2));
        let (ll, lr) = tree.apply_numeric_split(l, 1, 2.0, false, 1.0, 0.2);
        assert_eq!((ll, lr), (3, 4));
        tree.make_leaf(r, 5.0);
        tree.make_leaf(ll, -1.0);
        tree.make_leaf(lr, 1.0);
        tree.set_cover(root, 10.0);

        let frozen = tree.freeze();
        assert_eq!(frozen.n_nodes(), 5);
        assert!(frozen.validate().is_ok());
        assert_eq!(frozen.value(0), 0.1);
        assert_eq!(frozen.gains().unwrap()[0], 3.0);
        assert_eq!(frozen.covers().unwrap()[0], 10.0);
        assert_eq!(frozen.predict_row(arr1(&[0.2, 1.0]).view()), -1.0);
        assert_eq!(frozen.predict_row(arr1(&[0.2, 3.0]).view()), 1.0);
        assert_eq!(frozen.predict_row(arr1(&[0.9, 3.0]).view()), 5.0);
    }

    #[test]
    fn make_leaf_clears_split_fields() {
        let mut tree = MutableTree::new();
        tree.init_root_with_n_nodes(1);
        tree.set_numeric_split(0, 3, 1.5, true, 1, 2);
        tree.make_leaf(0, 0.25);
        let frozen = tree.freeze();
        assert!(frozen.is_leaf(0));
        assert_eq!(frozen.split_index(0), 0);
        assert_eq!(frozen.value(0), 0.25);
    }
}
