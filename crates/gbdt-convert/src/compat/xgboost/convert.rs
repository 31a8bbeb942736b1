//! Conversion from XGBoost JSON types to native types.

use crate::model::{Booster, ModelMeta};
use crate::repr::gbdt::{Forest, ForestValidationError, MutableTree, Tree};
use crate::training::{LogisticLoss, Objective, ObjectiveFn, prob_to_margin};

use super::json::{GradientBooster, ModelTrees, Tree as XgbTree, XgbModel};

/// Error type for XGBoost model conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error("booster `{0}` is not supported, only gbtree")]
    UnsupportedBooster(&'static str),
    #[error("objective `{0}` is not supported")]
    UnsupportedObjective(String),
    #[error("multi-output models are not supported (num_class={num_class}, num_target={num_target})")]
    MultiOutput { num_class: i64, num_target: i64 },
    #[error("tree {0} has no nodes")]
    EmptyTree(usize),
    #[error("tree {tree}: `{field}` has {actual} entries, expected {expected}")]
    ArrayLenMismatch {
        tree: usize,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error(
        "invalid node index in tree {tree}: node {node} references child {child} but tree has {num_nodes} nodes"
    )]
    InvalidNodeIndex {
        tree: usize,
        node: usize,
        child: i32,
        num_nodes: usize,
    },
    #[error("tree {tree}: node {node} has a negative split index {index}")]
    InvalidSplitIndex { tree: usize, node: usize, index: i32 },
    #[error("tree {tree}: node {node} uses a categorical split")]
    CategoricalSplit { tree: usize, node: usize },
    #[error(transparent)]
    InvalidForest(#[from] ForestValidationError),
}

/// Convert `base_score` from output space to margin space.
///
/// XGBoost stores the probability for logistic objectives; `binary:logitraw`
/// and regression store the margin directly.
pub(crate) fn base_score_to_margin(objective: Objective, base_score: f32) -> f32 {
    match objective {
        Objective::LogisticLoss(LogisticLoss { raw_output: false }) => {
            prob_to_margin(base_score as f64) as f32
        }
        _ => base_score,
    }
}

/// Inverse of [`base_score_to_margin`].
pub(crate) fn margin_to_base_score(objective: Objective, margin: f32) -> f32 {
    match objective {
        Objective::LogisticLoss(LogisticLoss { raw_output: false }) => LogisticLoss::sigmoid(margin),
        _ => margin,
    }
}

impl XgbModel {
    /// Resolve the objective, rejecting anything without a native counterpart.
    pub fn objective(&self) -> Result<Objective, ConversionError> {
        let name = &self.learner.objective.name;
        Objective::from_xgb_name(name).ok_or_else(|| ConversionError::UnsupportedObjective(name.clone()))
    }

    fn model_trees(&self) -> Result<&ModelTrees, ConversionError> {
        match &self.learner.gradient_booster {
            GradientBooster::Gbtree { model } => Ok(model),
            other => Err(ConversionError::UnsupportedBooster(other.name())),
        }
    }

    /// Convert to a native single-output [`Forest`] in margin space.
    pub fn to_forest(&self) -> Result<Forest, ConversionError> {
        let params = &self.learner.learner_model_param;
        if params.n_class > 1 || params.num_target > 1 {
            return Err(ConversionError::MultiOutput {
                num_class: params.n_class,
                num_target: params.num_target,
            });
        }

        let objective = self.objective()?;
        let model_trees = self.model_trees()?;

        let base_score = base_score_to_margin(objective, params.base_score);
        let mut forest = Forest::for_regression().with_base_score(vec![base_score]);

        for (tree_idx, xgb_tree) in model_trees.trees.iter().enumerate() {
            let tree_group = model_trees.tree_info.get(tree_idx).copied().unwrap_or(0).max(0) as u32;
            forest.push_tree(convert_tree(xgb_tree, tree_idx)?, tree_group);
        }

        forest.validate()?;
        Ok(forest)
    }

    /// Convert to a native [`Booster`].
    pub fn to_booster(&self) -> Result<Booster, ConversionError> {
        let objective = self.objective()?;
        let forest = self.to_forest()?;
        let learner = &self.learner;

        let meta = ModelMeta {
            feature_names: (!learner.feature_names.is_empty()).then(|| learner.feature_names.clone()),
            n_features: learner.learner_model_param.n_features.max(0) as usize,
            n_groups: 1,
            task: objective.task_kind(),
            base_scores: forest.base_score().to_vec(),
        };

        tracing::debug!(
            n_trees = forest.n_trees(),
            objective = objective.name(),
            "converted XGBoost model"
        );
        Ok(Booster::new(forest, meta, objective))
    }
}

fn check_len<T>(tree: usize, field: &'static str, values: &[T], expected: usize) -> Result<(), ConversionError> {
    if values.len() != expected {
        return Err(ConversionError::ArrayLenMismatch {
            tree,
            field,
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

fn child_index(tree: usize, node: usize, child: i32, num_nodes: usize) -> Result<u32, ConversionError> {
    if child < 0 || child as usize >= num_nodes {
        return Err(ConversionError::InvalidNodeIndex {
            tree,
            node,
            child,
            num_nodes,
        });
    }
    Ok(child as u32)
}

/// Convert a single XGBoost tree to a native [`Tree`].
fn convert_tree(xgb_tree: &XgbTree, tree_idx: usize) -> Result<Tree, ConversionError> {
    let num_nodes = xgb_tree.left_children.len();
    if num_nodes == 0 {
        return Err(ConversionError::EmptyTree(tree_idx));
    }
    check_len(tree_idx, "right_children", &xgb_tree.right_children, num_nodes)?;
    check_len(tree_idx, "split_indices", &xgb_tree.split_indices, num_nodes)?;
    check_len(tree_idx, "split_conditions", &xgb_tree.split_conditions, num_nodes)?;
    check_len(tree_idx, "default_left", &xgb_tree.default_left, num_nodes)?;

    if let Some(&node) = xgb_tree.categories_nodes.first() {
        return Err(ConversionError::CategoricalSplit {
            tree: tree_idx,
            node: node.max(0) as usize,
        });
    }

    let weights = (xgb_tree.base_weights.len() == num_nodes).then_some(&xgb_tree.base_weights);
    let gains = (xgb_tree.loss_changes.len() == num_nodes).then_some(&xgb_tree.loss_changes);
    let covers = (xgb_tree.sum_hessian.len() == num_nodes).then_some(&xgb_tree.sum_hessian);

    // XGBoost stores nodes in BFS order, which matches our layout.
    let mut tree = MutableTree::with_capacity(num_nodes);
    tree.init_root_with_n_nodes(num_nodes);

    for node_idx in 0..num_nodes {
        let node = node_idx as u32;
        let left_child = xgb_tree.left_children[node_idx];

        if left_child == -1 {
            tree.make_leaf(node, xgb_tree.split_conditions[node_idx]);
        } else {
            if xgb_tree.split_type.get(node_idx).copied().unwrap_or(0) != 0 {
                return Err(ConversionError::CategoricalSplit {
                    tree: tree_idx,
                    node: node_idx,
                });
            }
            let feature = xgb_tree.split_indices[node_idx];
            if feature < 0 {
                return Err(ConversionError::InvalidSplitIndex {
                    tree: tree_idx,
                    node: node_idx,
                    index: feature,
                });
            }
            let left = child_index(tree_idx, node_idx, left_child, num_nodes)?;
            let right = child_index(tree_idx, node_idx, xgb_tree.right_children[node_idx], num_nodes)?;
            tree.set_numeric_split(
                node,
                feature as u32,
                xgb_tree.split_conditions[node_idx],
                xgb_tree.default_left[node_idx] != 0,
                left,
                right,
            );
            if let Some(weights) = weights {
                tree.set_value(node, weights[node_idx]);
            }
        }

        tree.set_stats(
            node,
            gains.map_or(0.0, |g| g[node_idx]),
            covers.map_or(0.0, |c| c[node_idx]),
        );
    }

    Ok(tree.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::xgboost::XgbJsonError;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use serde_json::{Value, json};

    /// Two-feature depth-2 model in the shape XGBoost 2.x writes.
    fn xgb_document(objective: &str, base_score: &str) -> Value {
        json!({
            "learner": {
                "attributes": {},
                "feature_names": ["a", "b"],
                "feature_types": ["float", "float"],
                "gradient_booster": {
                    "name": "gbtree",
                    "model": {
                        "gbtree_model_param": {"num_parallel_tree": "1", "num_trees": "1"},
                        "iteration_indptr": [0, 1],
                        "tree_info": [0],
                        "trees": [{
                            "base_weights": [0.0, -0.2, 0.4, -0.1, -0.3],
                            "categories": [],
                            "categories_nodes": [],
                            "categories_segments": [],
                            "categories_sizes": [],
                            "default_left": [1, 0, 0, 0, 0],
                            "id": 0,
                            "left_children": [1, 3, -1, -1, -1],
                            "loss_changes": [5.0, 1.0, 0.0, 0.0, 0.0],
                            "parents": [2147483647, 0, 0, 1, 1],
                            "right_children": [2, 4, -1, -1, -1],
                            "split_conditions": [0.5, 2.0, 0.4, -0.1, -0.3],
                            "split_indices": [0, 1, 0, 0, 0],
                            "split_type": [0, 0, 0, 0, 0],
                            "sum_hessian": [10.0, 6.0, 4.0, 3.0, 3.0],
                            "tree_param": {
                                "num_deleted": "0",
                                "num_feature": "2",
                                "num_nodes": "5",
                                "size_leaf_vector": "1"
                            }
                        }]
                    }
                },
                "learner_model_param": {
                    "base_score": base_score,
                    "boost_from_average": "1",
                    "num_class": "0",
                    "num_feature": "2",
                    "num_target": "1"
                },
                "objective": {"name": objective, "reg_loss_param": {"scale_pos_weight": "1"}}
            },
            "version": [2, 1, 0]
        })
    }

    fn parse(doc: &Value) -> XgbModel {
        XgbModel::from_value(doc).unwrap()
    }

    #[test]
    fn converts_regression_tree() {
        let booster = parse(&xgb_document("reg:squarederror", "1E0")).to_booster().unwrap();
        assert_eq!(booster.n_features(), 2);
        assert_eq!(booster.feature_names(), Some(&["a".to_string(), "b".to_string()][..]));

        let tree = booster.forest().tree(0);
        assert_eq!(tree.n_nodes(), 5);
        assert!(tree.default_left(0));
        assert_eq!(tree.value(1), -0.2);
        assert_eq!(tree.covers().unwrap()[0], 10.0);

        // base 1.0 + leaf
        let features = array![[0.0f32, 1.0], [0.0, 3.0], [1.0, 0.0], [f32::NAN, 3.0]];
        let preds = booster.predict(features.view());
        for (got, want) in preds.row(0).iter().zip([0.9f32, 0.7, 1.4, 0.7]) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-6);
        }
    }

    #[test]
    fn logistic_base_score_is_converted_to_margin() {
        let booster = parse(&xgb_document("binary:logistic", "[5E-1]")).to_booster().unwrap();
        assert_abs_diff_eq!(booster.forest().base_score()[0], 0.0, epsilon = 1e-6);
        assert!(booster.meta().task.is_classification());

        let legacy = parse(&xgb_document("reg:logistic", "7.310586E-1")).to_booster().unwrap();
        assert_abs_diff_eq!(legacy.forest().base_score()[0], 1.0, epsilon = 1e-4);
        assert_eq!(legacy.objective(), Objective::logistic());

        let raw = parse(&xgb_document("binary:logitraw", "2E0")).to_booster().unwrap();
        assert_eq!(raw.forest().base_score()[0], 2.0);
    }

    #[test]
    fn rejects_unsupported_objective() {
        let err = parse(&xgb_document("count:poisson", "1E0")).to_booster().unwrap_err();
        assert_eq!(err, ConversionError::UnsupportedObjective("count:poisson".into()));
    }

    #[test]
    fn rejects_multiclass() {
        let mut doc = xgb_document("reg:squarederror", "1E0");
        doc["learner"]["learner_model_param"]["num_class"] = json!("3");
        let err = parse(&doc).to_forest().unwrap_err();
        assert!(matches!(err, ConversionError::MultiOutput { num_class: 3, .. }));
    }

    #[test]
    fn rejects_gblinear() {
        let mut doc = xgb_document("reg:squarederror", "1E0");
        doc["learner"]["gradient_booster"] = json!({"name": "gblinear", "model": {"weights": [0.1, 0.2, 0.0]}});
        let err = parse(&doc).to_booster().unwrap_err();
        assert_eq!(err, ConversionError::UnsupportedBooster("gblinear"));
    }

    #[test]
    fn rejects_out_of_range_child() {
        let mut doc = xgb_document("reg:squarederror", "1E0");
        doc["learner"]["gradient_booster"]["model"]["trees"][0]["right_children"][1] = json!(9);
        let err = parse(&doc).to_forest().unwrap_err();
        assert!(matches!(err, ConversionError::InvalidNodeIndex { node: 1, child: 9, .. }));
    }

    #[test]
    fn rejects_unreachable_nodes() {
        let mut doc = xgb_document("reg:squarederror", "1E0");
        // Node 1 points at itself; nodes 3 and 4 become unreachable.
        doc["learner"]["gradient_booster"]["model"]["trees"][0]["left_children"][1] = json!(1);
        let err = parse(&doc).to_forest().unwrap_err();
        assert!(matches!(err, ConversionError::InvalidForest(_)));
    }

    #[test]
    fn rejects_categorical_split() {
        let mut doc = xgb_document("reg:squarederror", "1E0");
        doc["learner"]["gradient_booster"]["model"]["trees"][0]["split_type"][0] = json!(1);
        let err = parse(&doc).to_forest().unwrap_err();
        assert_eq!(err, ConversionError::CategoricalSplit { tree: 0, node: 0 });
    }

    #[test]
    fn rejects_short_arrays() {
        let mut doc = xgb_document("reg:squarederror", "1E0");
        doc["learner"]["gradient_booster"]["model"]["trees"][0]["split_conditions"] = json!([0.5]);
        let err = parse(&doc).to_forest().unwrap_err();
        assert!(matches!(
            err,
            ConversionError::ArrayLenMismatch {
                field: "split_conditions",
                expected: 5,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn conversion_error_surfaces_through_json_error() {
        let err: XgbJsonError = ConversionError::EmptyTree(3).into();
        assert!(err.to_string().contains("tree 3 has no nodes"));
    }
}
