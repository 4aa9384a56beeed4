#![allow(missing_docs)]

use assert_cmd::Command;
use serde_json::{json, Value};

fn uniform_parameters() -> Value {
    json!({
        "pa": {"num": 1, "denom": 4},
        "pc": {"num": 1, "denom": 4},
        "pg": {"num": 1, "denom": 4},
        "pt": {"num": 1, "denom": 4},
        "lambda": {"num": 1, "denom": 1},
        "mu": {"num": 2, "denom": 1},
        "tau": {"num": 1, "denom": 10}
    })
}

#[test]
fn reports_one_timing_per_sample() {
    let request = json!({
        "parameters": uniform_parameters(),
        "sequence_a": "ACGT",
        "sequence_b": "AGGT",
        "samples": 3,
        "precision": "double"
    });
    let assert = Command::cargo_bin("tkf91-bench")
        .unwrap()
        .write_stdin(request.to_string())
        .assert()
        .success();
    let response: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(response["ticks_per_second"], 1_000_000);
    assert_eq!(response["elapsed_ticks"].as_array().unwrap().len(), 3);
    // The last sample's alignment is echoed back.
    assert_eq!(response["sequence_a"], "ACGT");
    assert_eq!(response["sequence_b"], "AGGT");
}

#[test]
fn missing_precision_uses_the_escalation_driver() {
    let request = json!({
        "parameters": uniform_parameters(),
        "sequence_a": "AC",
        "sequence_b": "AC",
        "samples": 1
    });
    let assert = Command::cargo_bin("tkf91-bench")
        .unwrap()
        .write_stdin(request.to_string())
        .assert()
        .success();
    let response: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(response["elapsed_ticks"].as_array().unwrap().len(), 1);
    assert_eq!(response["sequence_a"], "AC");
}

#[test]
fn zero_samples_is_rejected() {
    let request = json!({
        "parameters": uniform_parameters(),
        "sequence_a": "A",
        "sequence_b": "A",
        "samples": 0
    });
    Command::cargo_bin("tkf91-bench")
        .unwrap()
        .write_stdin(request.to_string())
        .assert()
        .failure()
        .stderr(predicates::str::contains("samples"));
}
