//! Test helpers: hand-built trees and synthetic data.

use ndarray::{Array1, Array2};
use rand::prelude::*;

/// Build a [`Tree`](crate::repr::gbdt::Tree) from a node listing.
///
/// Node ids must be `0..n` and listed once each. `L`/`R` is the default
/// direction for missing values.
///
/// ```
/// let tree = gbdt_convert::scalar_tree! {
///     0 => num(0, 0.5, L) -> 1, 2,
///     1 => leaf(1.0),
///     2 => leaf(2.0),
/// };
/// assert_eq!(tree.n_nodes(), 3);
/// ```
#[macro_export]
macro_rules! scalar_tree {
    (@node $tree:ident, $id:literal, leaf($value:expr)) => {
        $tree.make_leaf($id, $value);
    };
    (@node $tree:ident, $id:literal, num($feature:expr, $threshold:expr, $dir:ident) -> $left:literal, $right:literal) => {
        $tree.set_numeric_split($id, $feature, $threshold, $crate::scalar_tree!(@dir $dir), $left, $right);
    };
    (@dir L) => { true };
    (@dir R) => { false };
    ($($id:literal => $kind:ident $args:tt $(-> $left:literal, $right:literal)?),+ $(,)?) => {{
        let mut __tree = $crate::repr::gbdt::MutableTree::new();
        __tree.init_root_with_n_nodes([$($id),+].len());
        $( $crate::scalar_tree!(@node __tree, $id, $kind $args $(-> $left, $right)?); )+
        __tree.freeze()
    }};
}

/// Random features in `[min, max)` with shape `[rows, cols]`.
pub fn random_features(rows: usize, cols: usize, seed: u64, min: f32, max: f32) -> Array2<f32> {
    assert!(max >= min);
    let mut rng = StdRng::seed_from_u64(seed);
    let width = max - min;
    Array2::from_shape_simple_fn((rows, cols), || min + rng.r#gen::<f32>() * width)
}

/// Linear targets over `features` plus uniform noise in `[-noise, noise)`.
pub fn linear_targets(features: &Array2<f32>, seed: u64, noise: f32) -> Array1<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let weights: Vec<f32> = (0..features.ncols())
        .map(|_| rng.r#gen::<f32>() * 2.0 - 1.0)
        .collect();
    features
        .rows()
        .into_iter()
        .map(|row| {
            let y: f32 = row.iter().zip(&weights).map(|(x, w)| x * w).sum();
            y + (rng.r#gen::<f32>() * 2.0 - 1.0) * noise
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_tree_builds_nested_splits() {
        let tree = crate::scalar_tree! {
            0 => num(1, 2.0, R) -> 1, 2,
            1 => num(0, 0.5, L) -> 3, 4,
            2 => leaf(9.0),
            3 => leaf(1.0),
            4 => leaf(2.0),
        };
        assert_eq!(tree.n_nodes(), 5);
        assert!(tree.validate().is_ok());
        assert_eq!(tree.split_index(0), 1);
        assert!(!tree.default_left(0));
        assert!(tree.default_left(1));
    }

    #[test]
    fn synthetic_data_is_seeded() {
        let a = random_features(10, 3, 7, -1.0, 1.0);
        let b = random_features(10, 3, 7, -1.0, 1.0);
        assert_eq!(a, b);
        assert!(a.iter().all(|&v| (-1.0..1.0).contains(&v)));
        assert_eq!(linear_targets(&a, 1, 0.1), linear_targets(&b, 1, 0.1));
    }
}
