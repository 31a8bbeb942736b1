//! Payload structures for the native storage format.
//!
//! These mirror the runtime types in a flat shape suited to Postcard.
//! Conversions validate on the way in: a decoded forest is only handed out
//! after [`Forest::validate`] succeeds.

use serde::{Deserialize, Serialize};

use crate::model::gbdt::{GBDTConfig, RegularizationParams, SamplingParams, TreeParams};
use crate::model::{Booster, ModelMeta};
use crate::repr::gbdt::{Forest, Tree};
use crate::training::{Metric, MetricFn, Objective, ObjectiveFn, Verbosity};

use super::native::DeserializeError;

// ============================================================================
// Top-Level Payload
// ============================================================================

/// Version-tagged payload enum.
///
/// New format versions add variants rather than modifying existing ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Payload {
    V1(PayloadV1),
}

/// Version 1 payload structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadV1 {
    pub metadata: ModelMetadata,
    pub forest: ForestPayload,
    /// Training configuration; present for estimators only.
    pub config: Option<ConfigPayload>,
}

// ============================================================================
// Metadata
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub num_features: u32,
    pub num_groups: u32,
    /// Margin-space base score per group.
    pub base_scores: Vec<f32>,
    /// XGBoost objective name (e.g. "reg:squarederror").
    pub objective: String,
    pub feature_names: Option<Vec<String>>,
}

// ============================================================================
// Forest
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestPayload {
    pub num_trees: u32,
    /// Group assignment for each tree.
    pub tree_groups: Vec<u32>,
    pub trees: Vec<TreePayload>,
}

/// Single decision tree in struct-of-arrays form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreePayload {
    pub num_nodes: u32,
    pub split_features: Vec<u32>,
    pub thresholds: Vec<f32>,
    /// 0 for leaves.
    pub left_children: Vec<u32>,
    /// 0 for leaves.
    pub right_children: Vec<u32>,
    pub default_left: Vec<bool>,
    pub is_leaf: Vec<bool>,
    /// Leaf outputs; split nodes keep their own weight.
    pub values: Vec<f32>,
    pub gains: Option<Vec<f32>>,
    pub covers: Option<Vec<f32>>,
}

// ============================================================================
// Config
// ============================================================================

/// Estimator hyperparameters. The objective lives in [`ModelMetadata`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigPayload {
    pub metric: Option<String>,
    pub n_trees: u32,
    pub learning_rate: f32,
    pub tree: TreeParams,
    pub regularization: RegularizationParams,
    pub sampling: SamplingParams,
    pub seed: u64,
    pub verbosity: Verbosity,
}

// ============================================================================
// Runtime -> payload
// ============================================================================

impl From<&Tree> for TreePayload {
    fn from(tree: &Tree) -> Self {
        let n = tree.n_nodes() as u32;
        Self {
            num_nodes: n,
            split_features: (0..n).map(|i| tree.split_index(i)).collect(),
            thresholds: (0..n).map(|i| tree.split_threshold(i)).collect(),
            left_children: (0..n).map(|i| tree.left_child(i)).collect(),
            right_children: (0..n).map(|i| tree.right_child(i)).collect(),
            default_left: (0..n).map(|i| tree.default_left(i)).collect(),
            is_leaf: (0..n).map(|i| tree.is_leaf(i)).collect(),
            values: (0..n).map(|i| tree.value(i)).collect(),
            gains: tree.gains().map(<[f32]>::to_vec),
            covers: tree.covers().map(<[f32]>::to_vec),
        }
    }
}

impl From<&Forest> for ForestPayload {
    fn from(forest: &Forest) -> Self {
        Self {
            num_trees: forest.n_trees() as u32,
            tree_groups: forest.tree_groups().to_vec(),
            trees: forest.trees().map(TreePayload::from).collect(),
        }
    }
}

impl From<&GBDTConfig> for ConfigPayload {
    fn from(config: &GBDTConfig) -> Self {
        Self {
            metric: config.metric.map(|m| m.name().to_string()),
            n_trees: config.n_trees,
            learning_rate: config.learning_rate,
            tree: config.tree.clone(),
            regularization: config.regularization.clone(),
            sampling: config.sampling.clone(),
            seed: config.seed,
            verbosity: config.verbosity,
        }
    }
}

impl PayloadV1 {
    /// Payload of a raw booster (no configuration).
    pub fn from_booster(booster: &Booster) -> Self {
        let meta = booster.meta();
        Self {
            metadata: ModelMetadata {
                num_features: meta.n_features as u32,
                num_groups: booster.forest().n_groups(),
                base_scores: booster.forest().base_score().to_vec(),
                objective: booster.objective().xgb_name().to_string(),
                feature_names: meta.feature_names.clone(),
            },
            forest: ForestPayload::from(booster.forest()),
            config: None,
        }
    }

    /// Payload of an estimator: booster plus configuration.
    pub fn from_estimator(booster: &Booster, config: &GBDTConfig) -> Self {
        Self {
            config: Some(ConfigPayload::from(config)),
            ..Self::from_booster(booster)
        }
    }
}

// ============================================================================
// Payload -> runtime
// ============================================================================

fn corrupt(msg: impl Into<String>) -> DeserializeError {
    DeserializeError::CorruptPayload(msg.into())
}

impl TreePayload {
    fn into_tree(self, tree_idx: usize) -> Result<Tree, DeserializeError> {
        let n = self.num_nodes as usize;
        let lens = [
            ("split_features", self.split_features.len()),
            ("thresholds", self.thresholds.len()),
            ("left_children", self.left_children.len()),
            ("right_children", self.right_children.len()),
            ("default_left", self.default_left.len()),
            ("is_leaf", self.is_leaf.len()),
            ("values", self.values.len()),
            ("gains", self.gains.as_ref().map_or(n, Vec::len)),
            ("covers", self.covers.as_ref().map_or(n, Vec::len)),
        ];
        if let Some((field, len)) = lens.iter().find(|(_, len)| *len != n) {
            return Err(corrupt(format!(
                "tree {tree_idx}: {field} has {len} entries, expected {n}"
            )));
        }

        let mut tree = Tree::new(
            self.split_features,
            self.thresholds,
            self.left_children,
            self.right_children,
            self.default_left,
            self.is_leaf,
            self.values,
        );
        if let Some(gains) = self.gains {
            tree = tree.with_gains(gains);
        }
        if let Some(covers) = self.covers {
            tree = tree.with_covers(covers);
        }
        Ok(tree)
    }
}

impl ConfigPayload {
    pub fn into_config(self, objective: Objective) -> Result<GBDTConfig, DeserializeError> {
        let metric = self
            .metric
            .map(|name| Metric::from_name(&name).ok_or_else(|| corrupt(format!("unknown metric `{name}`"))))
            .transpose()?;

        let config = GBDTConfig {
            objective,
            metric,
            n_trees: self.n_trees,
            learning_rate: self.learning_rate,
            tree: self.tree,
            regularization: self.regularization,
            sampling: self.sampling,
            seed: self.seed,
            verbosity: self.verbosity,
        };
        config
            .validate()
            .map_err(|e| corrupt(format!("invalid configuration: {e}")))?;
        Ok(config)
    }
}

impl PayloadV1 {
    /// Rebuild the booster, validating every tree. Returns the configuration
    /// alongside when the payload carries one.
    pub fn into_parts(self) -> Result<(Booster, Option<GBDTConfig>), DeserializeError> {
        let metadata = self.metadata;
        let objective = Objective::from_xgb_name(&metadata.objective)
            .ok_or_else(|| corrupt(format!("unknown objective `{}`", metadata.objective)))?;

        if metadata.num_groups != 1 {
            return Err(corrupt(format!(
                "expected a single output group, got {}",
                metadata.num_groups
            )));
        }
        if self.forest.num_trees as usize != self.forest.trees.len() {
            return Err(corrupt(format!(
                "forest declares {} trees but holds {}",
                self.forest.num_trees,
                self.forest.trees.len()
            )));
        }
        if let Some(names) = &metadata.feature_names {
            if names.len() != metadata.num_features as usize {
                return Err(corrupt(format!(
                    "{} feature names for {} features",
                    names.len(),
                    metadata.num_features
                )));
            }
        }

        let trees = self
            .forest
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, t)| t.into_tree(i))
            .collect::<Result<Vec<_>, _>>()?;
        let forest = Forest::from_parts(
            trees,
            self.forest.tree_groups,
            metadata.num_groups,
            metadata.base_scores.clone(),
        );
        forest.validate()?;

        let meta = ModelMeta {
            feature_names: metadata.feature_names,
            n_features: metadata.num_features as usize,
            n_groups: metadata.num_groups as usize,
            task: objective.task_kind(),
            base_scores: metadata.base_scores,
        };
        let booster = Booster::new(forest, meta, objective);

        let config = self.config.map(|c| c.into_config(objective)).transpose()?;
        Ok((booster, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar_tree;

    fn booster() -> Booster {
        let mut forest = Forest::for_regression().with_base_score(vec![3.0]);
        forest.push_tree(
            scalar_tree! {
                0 => num(0, 1.0, L) -> 1, 2,
                1 => leaf(-1.0),
                2 => leaf(1.0),
            },
            0,
        );
        Booster::new(forest, ModelMeta::for_regression(1).with_base_scores(vec![3.0]), Objective::squared())
    }

    #[test]
    fn booster_payload_roundtrip() {
        let original = booster();
        let (restored, config) = PayloadV1::from_booster(&original).into_parts().unwrap();
        assert_eq!(restored, original);
        assert!(config.is_none());
    }

    #[test]
    fn estimator_payload_keeps_config() {
        let config = GBDTConfig::builder()
            .metric(Metric::mae())
            .n_trees(5)
            .learning_rate(0.05)
            .tree(TreeParams::depth_wise(3))
            .seed(11)
            .build()
            .unwrap();
        let (_, restored) = PayloadV1::from_estimator(&booster(), &config).into_parts().unwrap();
        assert_eq!(restored, Some(config));
    }

    #[test]
    fn mismatched_arrays_are_corrupt() {
        let mut payload = PayloadV1::from_booster(&booster());
        payload.forest.trees[0].thresholds.pop();
        let err = payload.into_parts().unwrap_err();
        assert!(matches!(err, DeserializeError::CorruptPayload(msg) if msg.contains("thresholds")));
    }

    #[test]
    fn invalid_tree_is_rejected() {
        let mut payload = PayloadV1::from_booster(&booster());
        payload.forest.trees[0].right_children[0] = 7;
        let err = payload.into_parts().unwrap_err();
        assert!(matches!(err, DeserializeError::InvalidForest(_)));
    }

    #[test]
    fn unknown_objective_is_corrupt() {
        let mut payload = PayloadV1::from_booster(&booster());
        payload.metadata.objective = "rank:ndcg".into();
        assert!(matches!(payload.into_parts(), Err(DeserializeError::CorruptPayload(_))));
    }
}
