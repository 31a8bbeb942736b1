//! Loading and saving models in the native format.
//!
//! A model file holds one of two shapes, told apart by the header's model-type
//! byte: a full estimator or a raw booster. [`load_model`] accepts both and
//! normalizes to an estimator; raw boosters get the default configuration.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::{Booster, GBDTModel};

use super::native::{DeserializeError, ModelType, NativeCodec, SerializeError};
use super::payload::{Payload, PayloadV1};

/// Errors from [`load_model`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Deserialize(#[from] DeserializeError),
}

/// A decoded model in the shape it was stored in.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistedModel {
    Estimator(GBDTModel),
    Booster(Booster),
}

impl PersistedModel {
    pub fn model_type(&self) -> ModelType {
        match self {
            Self::Estimator(_) => ModelType::Estimator,
            Self::Booster(_) => ModelType::Booster,
        }
    }

    /// Normalize to an estimator, wrapping raw boosters with the default config.
    pub fn into_estimator(self) -> GBDTModel {
        match self {
            Self::Estimator(model) => model,
            Self::Booster(booster) => GBDTModel::from_booster(booster),
        }
    }
}

// ============================================================================
// Encoding
// ============================================================================

fn encode(model_type: ModelType, booster: &Booster, payload: PayloadV1) -> Result<Vec<u8>, SerializeError> {
    NativeCodec::new().serialize(
        model_type,
        booster.n_features() as u32,
        booster.n_trees() as u32,
        &Payload::V1(payload),
    )
}

/// Encode an estimator (booster plus configuration).
pub fn encode_model(model: &GBDTModel) -> Result<Vec<u8>, SerializeError> {
    let booster = model.booster();
    encode(
        ModelType::Estimator,
        booster,
        PayloadV1::from_estimator(booster, model.config()),
    )
}

/// Encode a raw booster.
pub fn encode_booster(booster: &Booster) -> Result<Vec<u8>, SerializeError> {
    encode(ModelType::Booster, booster, PayloadV1::from_booster(booster))
}

/// Save an estimator to `path`.
pub fn save_model(model: &GBDTModel, path: impl AsRef<Path>) -> Result<(), SerializeError> {
    let bytes = encode_model(model)?;
    fs::write(path.as_ref(), bytes)?;
    tracing::debug!(path = %path.as_ref().display(), "saved estimator");
    Ok(())
}

/// Save a raw booster to `path`.
pub fn save_booster(booster: &Booster, path: impl AsRef<Path>) -> Result<(), SerializeError> {
    let bytes = encode_booster(booster)?;
    fs::write(path.as_ref(), bytes)?;
    tracing::debug!(path = %path.as_ref().display(), "saved booster");
    Ok(())
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a model from bytes, keeping the stored shape.
pub fn decode(bytes: &[u8]) -> Result<PersistedModel, DeserializeError> {
    let (header, payload): (_, Payload) = NativeCodec::new().deserialize(bytes)?;
    let Payload::V1(payload) = payload;

    let (booster, config) = payload.into_parts()?;

    if header.num_features as usize != booster.n_features() {
        return Err(DeserializeError::CorruptPayload(format!(
            "header declares {} features, payload {}",
            header.num_features,
            booster.n_features()
        )));
    }
    if header.num_trees as usize != booster.n_trees() {
        return Err(DeserializeError::CorruptPayload(format!(
            "header declares {} trees, payload {}",
            header.num_trees,
            booster.n_trees()
        )));
    }

    let stored = match (header.model_type, config) {
        (ModelType::Estimator, Some(config)) => {
            PersistedModel::Estimator(GBDTModel::from_parts(booster, config))
        }
        (ModelType::Booster, None) => PersistedModel::Booster(booster),
        (expected, Some(_)) => {
            return Err(DeserializeError::TypeMismatch {
                expected,
                actual: ModelType::Estimator,
            });
        }
        (expected, None) => {
            return Err(DeserializeError::TypeMismatch {
                expected,
                actual: ModelType::Booster,
            });
        }
    };
    Ok(stored)
}

/// Load a model from `path` and normalize it to an estimator.
pub fn load_model(path: impl AsRef<Path>) -> Result<GBDTModel, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path)?;
    let stored = decode(&bytes)?;
    tracing::info!(
        path = %path.display(),
        shape = ?stored.model_type(),
        "loaded model"
    );
    Ok(stored.into_estimator())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::native::HEADER_SIZE;
    use crate::model::ModelMeta;
    use crate::model::gbdt::GBDTConfig;
    use crate::repr::gbdt::Forest;
    use crate::scalar_tree;
    use crate::training::Objective;

    fn booster() -> Booster {
        let mut forest = Forest::for_regression().with_base_score(vec![1.0]);
        forest.push_tree(
            scalar_tree! {
                0 => num(1, 0.0, R) -> 1, 2,
                1 => leaf(-0.5),
                2 => leaf(0.5),
            },
            0,
        );
        Booster::new(
            forest,
            ModelMeta::for_regression(2).with_base_scores(vec![1.0]),
            Objective::squared(),
        )
    }

    #[test]
    fn estimator_roundtrip_keeps_config() {
        let config = GBDTConfig::builder().n_trees(1).seed(7).build().unwrap();
        let model = GBDTModel::from_parts(booster(), config);

        let bytes = encode_model(&model).unwrap();
        assert_eq!(bytes[6], ModelType::Estimator as u8);

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, PersistedModel::Estimator(model));
    }

    #[test]
    fn raw_booster_gets_default_config() {
        let bytes = encode_booster(&booster()).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.model_type(), ModelType::Booster);

        let model = decoded.into_estimator();
        assert_eq!(model.booster(), &booster());
        assert_eq!(model.config(), &GBDTConfig::default());
    }

    #[test]
    fn relabelled_shape_is_a_type_mismatch() {
        let mut bytes = encode_booster(&booster()).unwrap();
        // The model type is not covered by the payload checksum.
        bytes[6] = ModelType::Estimator as u8;
        assert!(matches!(
            decode(&bytes),
            Err(DeserializeError::TypeMismatch {
                expected: ModelType::Estimator,
                actual: ModelType::Booster
            })
        ));
    }

    #[test]
    fn header_counts_must_match_payload() {
        let mut bytes = encode_booster(&booster()).unwrap();
        bytes[20..24].copy_from_slice(&5u32.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(DeserializeError::CorruptPayload(_))));
    }

    #[test]
    fn short_file_is_truncated() {
        let bytes = encode_booster(&booster()).unwrap();
        assert!(matches!(
            decode(&bytes[..HEADER_SIZE - 4]),
            Err(DeserializeError::Truncated { .. })
        ));
        assert!(matches!(
            decode(&bytes[..bytes.len() - 1]),
            Err(DeserializeError::Truncated { .. })
        ));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.gbdt");
        let err = load_model(&path).unwrap_err();
        assert!(matches!(&err, LoadError::NotFound(p) if p == &path));
        assert_eq!(err.to_string(), format!("File not found: {}", path.display()));
    }

    #[test]
    fn save_then_load_both_shapes() {
        let dir = tempfile::tempdir().unwrap();

        let raw = dir.path().join("raw.gbdt");
        save_booster(&booster(), &raw).unwrap();
        assert_eq!(load_model(&raw).unwrap().booster(), &booster());

        let est = dir.path().join("est.gbdt");
        let model = GBDTModel::from_parts(booster(), GBDTConfig::builder().n_trees(3).build().unwrap());
        save_model(&model, &est).unwrap();
        assert_eq!(load_model(&est).unwrap(), model);
    }
}
