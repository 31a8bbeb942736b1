//! Conversion from native types to XGBoost JSON types.
//!
//! The produced document loads in XGBoost >= 2.0 and in scorers that read
//! its JSON model format.

use std::collections::BTreeMap;

use crate::model::Booster;
use crate::repr::gbdt::Tree;

use super::convert::margin_to_base_score;
use super::json::{
    GBTreeModelParam, GradientBooster, Learner, LearnerModelParam, ModelTrees, ObjectiveDef,
    RegLossParam, Tree as XgbTree, TreeParam, XgbModel,
};

/// XGBoost release whose layout we write.
pub const XGBOOST_VERSION: [u32; 3] = [2, 1, 0];

/// Parent marker XGBoost uses for the root node.
pub const ROOT_PARENT: i32 = i32::MAX;

impl XgbModel {
    /// Build the XGBoost JSON document describing `booster`.
    pub fn from_booster(booster: &Booster) -> Self {
        let forest = booster.forest();
        let objective = booster.objective();
        let n_features = booster.n_features();

        let trees: Vec<XgbTree> = forest
            .trees()
            .enumerate()
            .map(|(id, tree)| export_tree(tree, id, n_features))
            .collect();
        let n_trees = trees.len();

        let feature_names = booster.feature_names().map(<[String]>::to_vec).unwrap_or_default();
        let feature_types = vec!["float".to_string(); feature_names.len()];

        let base_score = forest.base_score().first().copied().unwrap_or(0.0);

        Self {
            learner: Learner {
                attributes: BTreeMap::new(),
                feature_names,
                feature_types,
                gradient_booster: GradientBooster::Gbtree {
                    model: ModelTrees {
                        gbtree_model_param: GBTreeModelParam {
                            num_parallel_tree: 1,
                            num_trees: n_trees as i64,
                        },
                        // One tree per boosting round.
                        iteration_indptr: (0..=n_trees as i64).collect(),
                        tree_info: forest.tree_groups().iter().map(|&g| g as i32).collect(),
                        trees,
                    },
                },
                learner_model_param: LearnerModelParam {
                    base_score: margin_to_base_score(objective, base_score),
                    boost_from_average: true,
                    n_class: 0,
                    n_features: n_features as i64,
                    num_target: 1,
                },
                objective: ObjectiveDef {
                    name: objective.xgb_name().to_string(),
                    reg_loss_param: Some(RegLossParam::default()),
                },
            },
            version: XGBOOST_VERSION,
        }
    }
}

fn export_tree(tree: &Tree, id: usize, n_features: usize) -> XgbTree {
    let n_nodes = tree.n_nodes();

    let mut left_children = vec![-1i32; n_nodes];
    let mut right_children = vec![-1i32; n_nodes];
    let mut parents = vec![ROOT_PARENT; n_nodes];
    let mut split_indices = vec![0i32; n_nodes];
    let mut split_conditions = vec![0.0f32; n_nodes];
    let mut default_left = vec![0i32; n_nodes];

    for node in 0..n_nodes as u32 {
        let idx = node as usize;
        if tree.is_leaf(node) {
            split_conditions[idx] = tree.value(node);
            continue;
        }
        let (left, right) = (tree.left_child(node), tree.right_child(node));
        left_children[idx] = left as i32;
        right_children[idx] = right as i32;
        parents[left as usize] = node as i32;
        parents[right as usize] = node as i32;
        split_indices[idx] = tree.split_index(node) as i32;
        split_conditions[idx] = tree.split_threshold(node);
        default_left[idx] = i32::from(tree.default_left(node));
    }

    XgbTree {
        base_weights: (0..n_nodes as u32).map(|n| tree.value(n)).collect(),
        categories: Vec::new(),
        categories_nodes: Vec::new(),
        categories_segments: Vec::new(),
        categories_sizes: Vec::new(),
        default_left,
        id: id as i32,
        left_children,
        loss_changes: tree.gains().map_or_else(|| vec![0.0; n_nodes], <[f32]>::to_vec),
        parents,
        right_children,
        split_conditions,
        split_indices,
        split_type: vec![0; n_nodes],
        sum_hessian: tree.covers().map_or_else(|| vec![0.0; n_nodes], <[f32]>::to_vec),
        tree_param: TreeParam {
            num_deleted: 0,
            num_feature: n_features as i64,
            num_nodes: n_nodes as i64,
            size_leaf_vector: 1,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelMeta;
    use crate::repr::gbdt::Forest;
    use crate::scalar_tree;
    use crate::training::{Objective, ObjectiveFn};
    use approx::assert_abs_diff_eq;
    use serde_json::json;

    fn booster(objective: Objective, base_score: f32) -> Booster {
        let mut forest = Forest::for_regression().with_base_score(vec![base_score]);
        forest.push_tree(
            scalar_tree! {
                0 => num(1, 2.5, R) -> 1, 2,
                1 => leaf(-1.0),
                2 => num(0, 0.5, L) -> 3, 4,
                3 => leaf(0.25),
                4 => leaf(0.75),
            },
            0,
        );
        forest.push_tree(scalar_tree! { 0 => leaf(0.5) }, 0);
        let meta = ModelMeta {
            feature_names: Some(vec!["x".into(), "y".into()]),
            n_features: 2,
            n_groups: 1,
            task: objective.task_kind(),
            base_scores: vec![base_score],
        };
        Booster::new(forest, meta, objective)
    }

    #[test]
    fn tree_arrays_follow_xgboost_conventions() {
        let model = XgbModel::from_booster(&booster(Objective::squared(), 14.0));
        let GradientBooster::Gbtree { model: trees } = &model.learner.gradient_booster else {
            panic!("expected gbtree");
        };
        let tree = &trees.trees[0];

        assert_eq!(tree.left_children, vec![1, -1, 3, -1, -1]);
        assert_eq!(tree.right_children, vec![2, -1, 4, -1, -1]);
        assert_eq!(tree.parents, vec![2147483647, 0, 0, 2, 2]);
        assert_eq!(tree.split_indices, vec![1, 0, 0, 0, 0]);
        assert_eq!(tree.split_conditions, vec![2.5, -1.0, 0.5, 0.25, 0.75]);
        assert_eq!(tree.default_left, vec![0, 0, 1, 0, 0]);
        assert_eq!(tree.split_type, vec![0; 5]);
        assert_eq!(tree.tree_param.num_nodes, 5);

        assert_eq!(trees.tree_info, vec![0, 0]);
        assert_eq!(trees.iteration_indptr, vec![0, 1, 2]);
        assert_eq!(trees.trees[1].parents, vec![ROOT_PARENT]);
        assert_eq!(trees.trees[1].id, 1);
    }

    #[test]
    fn document_layout_matches_xgboost() {
        let value = XgbModel::from_booster(&booster(Objective::squared(), 14.0))
            .to_value()
            .unwrap();

        assert_eq!(value["version"], json!([2, 1, 0]));
        let learner = &value["learner"];
        assert_eq!(learner["attributes"], json!({}));
        assert_eq!(learner["feature_names"], json!(["x", "y"]));
        assert_eq!(learner["feature_types"], json!(["float", "float"]));
        assert_eq!(
            learner["learner_model_param"],
            json!({
                "base_score": "1.4E1",
                "boost_from_average": "1",
                "num_class": "0",
                "num_feature": "2",
                "num_target": "1"
            })
        );
        assert_eq!(
            learner["objective"],
            json!({"name": "reg:squarederror", "reg_loss_param": {"scale_pos_weight": "1"}})
        );

        let gb = &learner["gradient_booster"];
        assert_eq!(gb["name"], "gbtree");
        assert_eq!(
            gb["model"]["gbtree_model_param"],
            json!({"num_parallel_tree": "1", "num_trees": "2"})
        );
        assert_eq!(
            gb["model"]["trees"][0]["tree_param"],
            json!({"num_deleted": "0", "num_feature": "2", "num_nodes": "5", "size_leaf_vector": "1"})
        );
        assert_eq!(gb["model"]["trees"][0]["categories"], json!([]));
    }

    #[test]
    fn logistic_base_score_written_as_probability() {
        let model = XgbModel::from_booster(&booster(Objective::logistic(), 0.0));
        assert_eq!(model.learner.learner_model_param.base_score, 0.5);
        assert_eq!(model.learner.objective.name, "binary:logistic");

        let raw = XgbModel::from_booster(&booster(Objective::logit_raw(), 0.0));
        assert_eq!(raw.learner.learner_model_param.base_score, 0.0);
    }

    #[test]
    fn export_then_import_preserves_booster() {
        for objective in [Objective::squared(), Objective::logistic(), Objective::logit_raw()] {
            let original = booster(objective, 0.3);
            let restored = XgbModel::from_booster(&original).to_booster().unwrap();

            assert_eq!(restored.objective(), objective);
            assert_eq!(restored.meta().feature_names, original.meta().feature_names);
            assert_eq!(restored.forest().tree(0), original.forest().tree(0));
            assert_abs_diff_eq!(
                restored.forest().base_score()[0],
                original.forest().base_score()[0],
                epsilon = 1e-6
            );
        }
    }
}
