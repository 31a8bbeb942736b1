//! Runs the `convert-model` binary.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

use gbdt_convert::io::save_booster;
use gbdt_convert::repr::gbdt::Forest;
use gbdt_convert::{Booster, ModelMeta, Objective, scalar_tree};

fn convert_model(args: &[&Path]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_convert-model"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn write_model(path: &Path) {
    let mut forest = Forest::for_regression().with_base_score(vec![7.0]);
    forest.push_tree(
        scalar_tree! {
            0 => num(1, 4.5, L) -> 1, 2,
            1 => leaf(-2.0),
            2 => leaf(3.0),
        },
        0,
    );
    let booster = Booster::new(
        forest,
        ModelMeta::for_regression(2).with_base_scores(vec![7.0]),
        Objective::squared(),
    );
    save_booster(&booster, path).unwrap();
}

#[test]
fn converts_input_to_requested_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("model.gbdt");
    let output = dir.path().join("model.json");
    write_model(&input);

    let out = convert_model(&[&input, &output]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], format!("Loading model from: {}", input.display()));
    assert_eq!(lines[1], "Converting model to JSON format...");
    assert_eq!(lines[2], format!("Model saved to: {}", output.display()));
    assert!(lines[3].starts_with("Output file size: ") && lines[3].ends_with(" KB"));
    assert_eq!(lines[4], "Conversion complete!");

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(doc["learner"]["learner_model_param"]["base_score"], "7E0");
    assert!(!dir.path().join("model.json.temp.json").exists());
}

#[test]
fn missing_input_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("absent.gbdt");
    let output = dir.path().join("model.json");

    let out = convert_model(&[&input, &output]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains(&format!("Error: File not found: {}", input.display())));
    assert!(!output.exists());
}

#[test]
fn unrecognized_model_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("model.gbdt");
    let output = dir.path().join("model.json");
    write_model(&input);
    let mut bytes = std::fs::read(&input).unwrap();
    bytes[6] = 0xEE;
    std::fs::write(&input, bytes).unwrap();

    let out = convert_model(&[&input, &output]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("unrecognized model type"));
    assert!(!output.exists());
}
