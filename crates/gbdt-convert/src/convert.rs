//! Conversion of an estimator into a pretty-printed XGBoost JSON file.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::compat::xgboost::XgbJsonError;
use crate::model::GBDTModel;

/// Suffix appended to the output path for the intermediate compact file.
pub const TEMP_SUFFIX: &str = ".temp.json";

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to export booster: {0}")]
    Export(#[from] XgbJsonError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConvertError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path) -> impl FnOnce(serde_json::Error) -> Self + '_ {
        move |source| Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// `<output>.temp.json`
pub fn temp_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// Write the model's booster to `output` as XGBoost JSON with 2-space indents.
///
/// The booster is first saved compactly next to the output, reloaded as a
/// generic JSON value (which sorts object keys) and removed. Returns the
/// document that was written.
pub fn convert_model_to_json(model: &GBDTModel, output: impl AsRef<Path>) -> Result<Value, ConvertError> {
    let output = output.as_ref();
    let booster = model.booster();
    let temp = temp_path(output);

    booster.save_json(&temp)?;

    let reloaded = File::open(&temp)
        .map_err(ConvertError::io(&temp))
        .and_then(|file| serde_json::from_reader(BufReader::new(file)).map_err(ConvertError::json(&temp)));
    // Remove the temp file even when the reload failed.
    let removed = fs::remove_file(&temp).map_err(ConvertError::io(&temp));
    let document: Value = reloaded?;
    removed?;

    write_pretty(&document, output)?;
    tracing::info!(
        output = %output.display(),
        trees = booster.n_trees(),
        "wrote XGBoost JSON"
    );
    Ok(document)
}

fn write_pretty(document: &Value, path: &Path) -> Result<(), ConvertError> {
    let file = File::create(path).map_err(ConvertError::io(path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, document).map_err(ConvertError::json(path))?;
    writer.flush().map_err(ConvertError::io(path))
}

/// Size of the file at `path` in KiB.
pub fn output_size_kb(path: impl AsRef<Path>) -> Result<f64, ConvertError> {
    let path = path.as_ref();
    let len = fs::metadata(path).map_err(ConvertError::io(path))?.len();
    Ok(len as f64 / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Booster, ModelMeta};
    use crate::repr::gbdt::Forest;
    use crate::scalar_tree;
    use crate::training::Objective;

    fn model() -> GBDTModel {
        let mut forest = Forest::for_regression().with_base_score(vec![14.0]);
        forest.push_tree(
            scalar_tree! {
                0 => num(0, 5.0, L) -> 1, 2,
                1 => leaf(-2.0),
                2 => leaf(2.0),
            },
            0,
        );
        let meta = ModelMeta::for_regression(1)
            .with_base_scores(vec![14.0])
            .with_feature_names(vec!["latest_score".into()]);
        GBDTModel::from_booster(Booster::new(forest, meta, Objective::squared()))
    }

    #[test]
    fn temp_path_appends_suffix() {
        assert_eq!(temp_path(Path::new("out/model.json")), PathBuf::from("out/model.json.temp.json"));
    }

    #[test]
    fn writes_indented_document_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("model.json");

        let document = convert_model_to_json(&model(), &output).unwrap();
        assert!(!temp_path(&output).exists());

        let text = fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("{\n  \"learner\": {\n    \"attributes\": {}"));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, document);
        assert_eq!(parsed["learner"]["learner_model_param"]["base_score"], "1.4E1");
    }

    #[test]
    fn size_is_reported_in_kib() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        fs::write(&path, vec![0u8; 2048]).unwrap();
        assert_eq!(output_size_kb(&path).unwrap(), 2.0);
    }

    #[test]
    fn missing_output_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("missing").join("model.json");
        assert!(convert_model_to_json(&model(), &output).is_err());
        assert!(!output.exists());
    }
}
