//! Canonical forest representation (collection of trees).

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut2};

use super::{Tree, TreeValidationError};

/// Structural validation errors for [`Forest`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForestValidationError {
    #[error("base score has {len} entries for {n_groups} groups")]
    BaseScoreLenMismatch { n_groups: u32, len: usize },
    #[error("{len} tree group assignments for {n_trees} trees")]
    TreeGroupsLenMismatch { n_trees: usize, len: usize },
    #[error("tree {tree_idx} assigned to group {group}, but forest has {n_groups} groups")]
    TreeGroupOutOfRange {
        tree_idx: usize,
        group: u32,
        n_groups: u32,
    },
    #[error("tree {tree_idx}: {error}")]
    InvalidTree {
        tree_idx: usize,
        error: TreeValidationError,
    },
}

/// Forest of decision trees.
///
/// Each tree contributes to one output group; the prediction for a group is
/// its base score plus the sum of its trees' leaf values (raw margin space).
#[derive(Debug, Clone, PartialEq)]
pub struct Forest {
    trees: Vec<Tree>,
    tree_groups: Vec<u32>,
    n_groups: u32,
    base_score: Vec<f32>,
}

impl Forest {
    /// Create a new forest with the given number of groups.
    pub fn new(n_groups: u32) -> Self {
        Self {
            trees: Vec::new(),
            tree_groups: Vec::new(),
            n_groups,
            base_score: vec![0.0; n_groups as usize],
        }
    }

    /// Create a forest with a single output group.
    pub fn for_regression() -> Self {
        Self::new(1)
    }

    /// Set the base score for all groups.
    pub fn with_base_score(mut self, base_score: Vec<f32>) -> Self {
        debug_assert_eq!(base_score.len(), self.n_groups as usize);
        self.base_score = base_score;
        self
    }

    /// Rebuild a forest from decoded parts. Call [`Forest::validate`] afterwards.
    pub(crate) fn from_parts(
        trees: Vec<Tree>,
        tree_groups: Vec<u32>,
        n_groups: u32,
        base_score: Vec<f32>,
    ) -> Self {
        Self {
            trees,
            tree_groups,
            n_groups,
            base_score,
        }
    }

    /// Add a tree to the forest.
    pub fn push_tree(&mut self, tree: Tree, group: u32) {
        debug_assert!(group < self.n_groups, "group out of range");
        self.trees.push(tree);
        self.tree_groups.push(group);
    }

    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[inline]
    pub fn n_groups(&self) -> u32 {
        self.n_groups
    }

    #[inline]
    pub fn base_score(&self) -> &[f32] {
        &self.base_score
    }

    #[inline]
    pub fn tree(&self, idx: usize) -> &Tree {
        &self.trees[idx]
    }

    #[inline]
    pub fn tree_groups(&self) -> &[u32] {
        &self.tree_groups
    }

    pub fn trees(&self) -> impl Iterator<Item = &Tree> {
        self.trees.iter()
    }

    /// Iterate over trees with their group assignments.
    pub fn trees_with_groups(&self) -> impl Iterator<Item = (&Tree, u32)> {
        self.trees
            .iter()
            .zip(self.tree_groups.iter())
            .map(|(t, &g)| (t, g))
    }

    /// Validate structural invariants (trees, group assignments, base score).
    pub fn validate(&self) -> Result<(), ForestValidationError> {
        if self.base_score.len() != self.n_groups as usize {
            return Err(ForestValidationError::BaseScoreLenMismatch {
                n_groups: self.n_groups,
                len: self.base_score.len(),
            });
        }
        if self.tree_groups.len() != self.trees.len() {
            return Err(ForestValidationError::TreeGroupsLenMismatch {
                n_trees: self.trees.len(),
                len: self.tree_groups.len(),
            });
        }

        for (i, &g) in self.tree_groups.iter().enumerate() {
            if g >= self.n_groups {
                return Err(ForestValidationError::TreeGroupOutOfRange {
                    tree_idx: i,
                    group: g,
                    n_groups: self.n_groups,
                });
            }
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|e| ForestValidationError::InvalidTree { tree_idx: i, error: e })?;
        }

        Ok(())
    }

    /// Raw prediction for a single row, one value per group.
    pub fn predict_row(&self, features: ArrayView1<f32>) -> Vec<f32> {
        let mut output = self.base_score.clone();
        for (tree, group) in self.trees_with_groups() {
            output[group as usize] += tree.predict_row(features);
        }
        output
    }

    /// Raw predictions for a `[n_rows, n_features]` matrix.
    ///
    /// Returns an array of shape `[n_groups, n_rows]`.
    pub fn predict(&self, features: ArrayView2<f32>) -> Array2<f32> {
        let mut output = Array2::zeros((self.n_groups as usize, features.nrows()));
        self.predict_into(features, output.view_mut());
        output
    }

    /// Batch predict into a pre-allocated `[n_groups, n_rows]` buffer.
    ///
    /// # Panics
    /// Panics if the buffer shape does not match.
    pub fn predict_into(&self, features: ArrayView2<f32>, mut output: ArrayViewMut2<f32>) {
        assert_eq!(
            output.dim(),
            (self.n_groups as usize, features.nrows()),
            "output buffer must have shape [n_groups, n_rows]"
        );

        for (group, &base) in self.base_score.iter().enumerate() {
            output.row_mut(group).fill(base);
        }

        for (tree, group) in self.trees_with_groups() {
            let mut out = output.row_mut(group as usize);
            for (row, value) in features.rows().into_iter().zip(out.iter_mut()) {
                *value += tree.predict_row(row);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn build_simple_tree(left_val: f32, right_val: f32, threshold: f32) -> Tree {
        crate::scalar_tree! {
            0 => num(0, threshold, L) -> 1, 2,
            1 => leaf(left_val),
            2 => leaf(right_val),
        }
    }

    #[test]
    fn forest_multiple_trees_sum() {
        let mut forest = Forest::for_regression();
        forest.push_tree(build_simple_tree(1.0, 2.0, 0.5), 0);
        forest.push_tree(build_simple_tree(0.5, 1.5, 0.5), 0);

        assert_eq!(forest.predict_row(arr1(&[0.3]).view()), vec![1.5]);
        assert_eq!(forest.predict_row(arr1(&[0.7]).view()), vec![3.5]);
    }

    #[test]
    fn forest_with_base_score() {
        let mut forest = Forest::for_regression().with_base_score(vec![0.5]);
        forest.push_tree(build_simple_tree(1.0, 2.0, 0.5), 0);
        assert_eq!(forest.predict_row(arr1(&[0.3]).view()), vec![1.5]);
    }

    #[test]
    fn predict_matches_predict_row() {
        let mut forest = Forest::for_regression().with_base_score(vec![0.1]);
        forest.push_tree(build_simple_tree(1.0, 2.0, 0.5), 0);
        forest.push_tree(build_simple_tree(0.5, 1.0, 0.5), 0);

        let data = arr2(&[[0.3f32], [0.7], [0.5]]);
        let batch = forest.predict(data.view());
        assert_eq!(batch.dim(), (1, 3));
        for (i, row) in data.rows().into_iter().enumerate() {
            let single = forest.predict_row(row)[0];
            approx::assert_abs_diff_eq!(batch[[0, i]], single, epsilon = 1e-6);
        }
    }

    #[test]
    fn validate_reports_group_errors() {
        let forest = Forest::from_parts(vec![build_simple_tree(1.0, 2.0, 0.5)], vec![3], 1, vec![0.0]);
        assert!(matches!(
            forest.validate(),
            Err(ForestValidationError::TreeGroupOutOfRange { group: 3, .. })
        ));

        let forest = Forest::from_parts(vec![], vec![], 2, vec![0.0]);
        assert!(matches!(
            forest.validate(),
            Err(ForestValidationError::BaseScoreLenMismatch { n_groups: 2, len: 1 })
        ));
    }
}
