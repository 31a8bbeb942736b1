//! XGBoost JSON model schema.
//!
//! Mirrors the document written by XGBoost >= 2.0 `Booster.save_model("*.json")`.
//! Numeric parameters inside `*_param` blocks are strings, exactly as XGBoost
//! writes them.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use serde_with::{DisplayFromStr, serde_as};

use super::convert::ConversionError;

/// Errors reading or writing XGBoost JSON.
#[derive(Debug, thiserror::Error)]
pub enum XgbJsonError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed XGBoost JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported XGBoost model: {0}")]
    Conversion(#[from] ConversionError),
}

// =============================================================================
// Custom (de)serializers for XGBoost-specific formats
// =============================================================================

fn deserialize_base_score<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as SerdeError;

    // Unwrap arrays and stringified arrays down to a scalar.
    let mut cur = Value::deserialize(deserializer)?;
    loop {
        match cur {
            Value::Number(n) => {
                return n
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| SerdeError::custom("invalid number"));
            }
            Value::String(s) => {
                if let Ok(f) = s.parse::<f32>() {
                    return Ok(f);
                }
                let t = s.trim();
                if let Some(inner) = t.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
                    if let Ok(f) = inner.trim().parse::<f32>() {
                        return Ok(f);
                    }
                }
                match serde_json::from_str::<Vec<Value>>(&s) {
                    Ok(arr) => match arr.into_iter().next() {
                        Some(first) => cur = first,
                        None => return Err(SerdeError::custom("empty base_score array")),
                    },
                    Err(_) => {
                        return Err(SerdeError::custom(format!(
                            "cannot parse base_score from string: {}",
                            s
                        )));
                    }
                }
            }
            Value::Array(arr) => match arr.into_iter().next() {
                Some(first) => cur = first,
                None => return Err(SerdeError::custom("empty base_score array")),
            },
            _ => {
                return Err(SerdeError::custom(
                    "base_score must be number, string, or array",
                ));
            }
        }
    }
}

/// XGBoost writes scores in scientific notation with an uppercase `E`.
fn serialize_base_score<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:E}", value))
}

fn deserialize_bool_any<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as SerdeError;

    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i != 0);
            }
            if let Some(f) = n.as_f64() {
                return Ok(f != 0.0);
            }
            Err(SerdeError::custom("invalid number for bool"))
        }
        Value::String(s) => {
            let t = s.trim();
            if t.eq_ignore_ascii_case("true") || t == "1" {
                return Ok(true);
            }
            if t.eq_ignore_ascii_case("false") || t == "0" {
                return Ok(false);
            }
            Err(SerdeError::custom(format!(
                "cannot parse bool from string: {}",
                s
            )))
        }
        _ => Err(SerdeError::custom("unsupported type for bool")),
    }
}

fn serialize_bool_flag<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "1" } else { "0" })
}

fn default_num_target() -> i64 {
    1
}
fn default_boost_from_average() -> bool {
    true
}

// =============================================================================
// Tree / model level definitions
// =============================================================================

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeParam {
    #[serde_as(as = "DisplayFromStr")]
    pub num_deleted: i64,
    #[serde_as(as = "DisplayFromStr")]
    pub num_feature: i64,
    #[serde_as(as = "DisplayFromStr")]
    pub num_nodes: i64,
    #[serde_as(as = "DisplayFromStr")]
    pub size_leaf_vector: i64,
}

/// One tree in XGBoost's parallel-array layout.
///
/// Leaves have `-1` children and carry their output in `split_conditions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub base_weights: Vec<f32>,
    #[serde(default)]
    pub categories: Vec<i32>,
    #[serde(default)]
    pub categories_nodes: Vec<i32>,
    #[serde(default)]
    pub categories_segments: Vec<i64>,
    #[serde(default)]
    pub categories_sizes: Vec<i64>,
    pub default_left: Vec<i32>,
    pub id: i32,
    pub left_children: Vec<i32>,
    pub loss_changes: Vec<f32>,
    pub parents: Vec<i32>,
    pub right_children: Vec<i32>,
    pub split_conditions: Vec<f32>,
    pub split_indices: Vec<i32>,
    #[serde(default)]
    pub split_type: Vec<i32>,
    pub sum_hessian: Vec<f32>,
    pub tree_param: TreeParam,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GBTreeModelParam {
    #[serde_as(as = "DisplayFromStr")]
    pub num_parallel_tree: i64,
    #[serde_as(as = "DisplayFromStr")]
    pub num_trees: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTrees {
    pub gbtree_model_param: GBTreeModelParam,
    /// Tree offsets per boosting round (XGBoost >= 2.0).
    #[serde(default)]
    pub iteration_indptr: Vec<i64>,
    pub tree_info: Vec<i32>,
    pub trees: Vec<Tree>,
}

impl ModelTrees {
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

// =============================================================================
// Gradient booster variants (gbtree | gblinear | dart)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbLinearModel {
    pub weights: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GBTreeDefinition {
    pub name: String,
    pub model: ModelTrees,
}

/// Only `gbtree` converts; the other variants parse so they can be rejected
/// with a clear error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum GradientBooster {
    Gbtree {
        model: ModelTrees,
    },
    Gblinear {
        model: GbLinearModel,
    },
    Dart {
        gbtree: GBTreeDefinition,
        weight_drop: Vec<f32>,
    },
}

impl GradientBooster {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gbtree { .. } => "gbtree",
            Self::Gblinear { .. } => "gblinear",
            Self::Dart { .. } => "dart",
        }
    }
}

// =============================================================================
// Objective / learner-level definitions
// =============================================================================

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegLossParam {
    #[serde_as(as = "DisplayFromStr")]
    pub scale_pos_weight: f32,
}

impl Default for RegLossParam {
    fn default() -> Self {
        Self {
            scale_pos_weight: 1.0,
        }
    }
}

/// Objective block: a name plus objective-specific parameters.
///
/// Parameter blocks other than `reg_loss_param` are ignored on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reg_loss_param: Option<RegLossParam>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerModelParam {
    /// Stored in output space (probability for logistic objectives).
    #[serde(
        deserialize_with = "deserialize_base_score",
        serialize_with = "serialize_base_score"
    )]
    pub base_score: f32,
    #[serde(
        deserialize_with = "deserialize_bool_any",
        serialize_with = "serialize_bool_flag",
        default = "default_boost_from_average"
    )]
    pub boost_from_average: bool,
    #[serde(rename = "num_class")]
    #[serde_as(as = "DisplayFromStr")]
    pub n_class: i64,
    #[serde(rename = "num_feature")]
    #[serde_as(as = "DisplayFromStr")]
    pub n_features: i64,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_num_target")]
    pub num_target: i64,
}

impl Default for LearnerModelParam {
    fn default() -> Self {
        Self {
            base_score: 0.5,
            boost_from_average: true,
            n_class: 0,
            n_features: 0,
            num_target: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Learner {
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub feature_types: Vec<String>,
    pub gradient_booster: GradientBooster,
    pub learner_model_param: LearnerModelParam,
    pub objective: ObjectiveDef,
}

// =============================================================================
// Top-level XGBoost model
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XgbModel {
    pub learner: Learner,
    pub version: [u32; 3],
}

impl XgbModel {
    /// Load a model from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, XgbJsonError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Parse a model from a serde_json Value.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
