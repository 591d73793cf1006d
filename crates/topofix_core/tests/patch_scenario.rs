//! End-to-end patch and verify scenarios over real files in a temp dir.

use std::fs;
use std::path::PathBuf;

use serde_json::{json, Value};
use topofix_core::{load_for_verification, patch_file, ModelSummary, PatchOptions};

/// A three-layer model where `dense_1` carries both legacy-incompatible
/// shapes: a `batch_shape` field and object-form `inbound_nodes` with two
/// valid `keras_history` args and one arg with no history at all.
fn incompatible_model() -> Value {
    json!({
        "modelTopology": {
            "class_name": "Functional",
            "config": {
                "name": "leaf_classifier",
                "layers": [
                    {
                        "class_name": "InputLayer",
                        "config": { "name": "input_1", "batch_input_shape": [null, 32, 32, 3] },
                        "inbound_nodes": []
                    },
                    {
                        "class_name": "Conv2D",
                        "config": { "name": "conv_1" },
                        "inbound_nodes": [[["input_1", 0, 0, {}]]]
                    },
                    {
                        "class_name": "Dense",
                        "config": { "name": "dense_1", "batch_shape": [null, 64] },
                        "inbound_nodes": [{
                            "args": [
                                { "config": { "keras_history": ["input_1", 0, 0] } },
                                { "config": { "keras_history": ["conv_1", 0, 0] } },
                                { "value": 0.5 }
                            ],
                            "kwargs": { "training": false }
                        }]
                    }
                ]
            }
        },
        "weightsManifest": [{
            "paths": ["group1-shard1of1.bin"],
            "weights": [
                { "name": "conv_1/kernel", "shape": [3, 3], "dtype": "float32" },
                { "name": "dense_1/bias", "shape": [2], "dtype": "float32" }
            ]
        }]
    })
}

/// 9 + 2 float32 elements declared by the manifest above.
const WEIGHT_BYTES: usize = 44;

fn write_model_dir() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("model.json");
    fs::write(
        &model_path,
        serde_json::to_string_pretty(&incompatible_model()).unwrap(),
    )
    .unwrap();
    fs::write(
        dir.path().join("group1-shard1of1.bin"),
        vec![0u8; WEIGHT_BYTES],
    )
    .unwrap();
    (dir, model_path)
}

#[test]
fn patch_reports_counts_and_rebuilds_inbound_nodes() {
    let (_dir, model_path) = write_model_dir();

    let report = patch_file(&model_path, &PatchOptions::default()).unwrap();
    assert_eq!(report.counts.batch_shape, 1);
    assert_eq!(report.counts.inbound_nodes, 1);
    assert!(report.written);

    let patched: Value =
        serde_json::from_str(&fs::read_to_string(&model_path).unwrap()).unwrap();
    let dense = &patched["modelTopology"]["config"]["layers"][2];

    // The history-less arg contributed no tuple: one inner list, two tuples.
    assert_eq!(
        dense["inbound_nodes"],
        json!([[
            ["input_1", 0, 0, { "training": false }],
            ["conv_1", 0, 0, { "training": false }]
        ]])
    );
    assert_eq!(dense["config"]["batch_input_shape"], json!([null, 64]));
    assert!(dense["config"].get("batch_shape").is_none());
}

#[test]
fn double_patch_is_idempotent_and_keeps_one_backup() {
    let (dir, model_path) = write_model_dir();
    let pristine = fs::read_to_string(&model_path).unwrap();

    let first = patch_file(&model_path, &PatchOptions::default()).unwrap();
    let after_first = fs::read_to_string(&model_path).unwrap();
    let second = patch_file(&model_path, &PatchOptions::default()).unwrap();

    assert!(!first.counts.is_clean());
    assert!(second.counts.is_clean());
    assert_eq!(fs::read_to_string(&model_path).unwrap(), after_first);

    // Exactly one backup, holding the pre-first-run bytes.
    let backups: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|name| name.contains("original"))
        .collect();
    assert_eq!(backups, vec!["model.original.json"]);
    assert_eq!(
        fs::read_to_string(dir.path().join("model.original.json")).unwrap(),
        pristine
    );
}

#[test]
fn verify_path_loads_normalizes_and_summarizes() {
    let (_dir, model_path) = write_model_dir();

    let loaded = load_for_verification(&model_path).unwrap();
    assert_eq!(loaded.inbound_patched, 1);
    assert_eq!(loaded.weights.len(), WEIGHT_BYTES);

    let summary = ModelSummary::build(
        loaded.model.topology().unwrap(),
        &loaded.manifest,
        loaded.weights.len(),
    )
    .unwrap();

    assert_eq!(summary.model_name.as_deref(), Some("leaf_classifier"));
    assert_eq!(summary.layers.len(), 3);
    assert_eq!(summary.layers[2].inbound, vec!["input_1", "conv_1"]);
    assert_eq!(summary.total_params, 11);
}

#[test]
fn patched_file_still_verifies() {
    let (_dir, model_path) = write_model_dir();

    patch_file(&model_path, &PatchOptions::default()).unwrap();

    let loaded = load_for_verification(&model_path).unwrap();
    // Already normalized on disk; the in-memory pass finds nothing.
    assert_eq!(loaded.inbound_patched, 0);
    let summary = ModelSummary::build(
        loaded.model.topology().unwrap(),
        &loaded.manifest,
        loaded.weights.len(),
    )
    .unwrap();
    assert_eq!(summary.layers.len(), 3);
}
