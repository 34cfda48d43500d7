use assert_cmd::prelude::*;
use rstest::rstest;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_profile(dir: &tempfile::TempDir) -> PathBuf {
    let body = r#"{
        "units": "mmol",
        "dia": 6,
        "timezone": "Europe/Prague",
        "sens": [{"time": "00:00", "value": 2.5}],
        "carbratio": [{"time": "00:00", "value": 8}],
        "basal": [
            {"time": "00:00", "value": 0.4},
            {"time": "08:00", "value": 0.8},
            {"time": "20:00", "value": 0.6}
        ],
        "target_low": [{"time": "00:00", "value": 5.0}],
        "target_high": [{"time": "00:00", "value": 6.5}]
    }"#;
    let path = dir.path().join("profile.json");
    fs::write(&path, body).unwrap();
    path
}

fn run(args: &[&str]) -> Value {
    let dir = tempdir().unwrap();
    let profile = write_profile(&dir);
    let out = Command::cargo_bin("profile_cli")
        .unwrap()
        .args(args)
        .arg("--profile")
        .arg(&profile)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    serde_json::from_slice(&out.stdout).unwrap()
}

/// Every list entry is exactly {time, timeAsSeconds, value}.
fn assert_entries(v: &Value, key: &str) {
    let list = v[key].as_array().unwrap_or_else(|| panic!("{key} missing"));
    assert!(!list.is_empty());
    for e in list {
        let obj = e.as_object().unwrap();
        assert_eq!(obj.len(), 3, "{key}: {e}");
        let time = obj["time"].as_str().unwrap();
        let secs = obj["timeAsSeconds"].as_i64().unwrap();
        assert_eq!(time.len(), 5);
        assert!(time.ends_with(":00"));
        assert_eq!(time[..2].parse::<i64>().unwrap() * 3600, secs);
        assert!(obj["value"].is_number());
    }
}

#[rstest]
#[case("export")]
#[case("normalize")]
fn document_shape(#[case] command: &str) {
    let v = run(&[command]);
    let obj = v.as_object().unwrap();
    assert_eq!(obj.len(), 8);
    assert_eq!(v["units"], "mmol");
    assert_eq!(v["dia"], 6.0);
    assert_eq!(v["timezone"], "Europe/Prague");
    for key in ["sens", "carbratio", "basal", "target_low", "target_high"] {
        assert_entries(&v, key);
    }
}

#[test]
fn export_keeps_profile_units_and_scales() {
    let v = run(&["export", "--percentage", "50"]);
    assert_eq!(v["sens"][0]["value"], 5.0);
    assert_eq!(v["carbratio"][0]["value"], 16.0);
    assert_eq!(v["basal"][1]["time"], "08:00");
    assert_eq!(v["basal"][1]["value"], 0.4);
    assert_eq!(v["target_low"][0]["value"], 5.0);
}

#[test]
fn normalize_rotates_to_midnight() {
    let v = run(&["normalize", "--timeshift", "4"]);
    // New 00:00 is old 20:00.
    let basal: Vec<(String, f64)> = v["basal"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| (e["time"].as_str().unwrap().to_string(), e["value"].as_f64().unwrap()))
        .collect();
    assert_eq!(
        basal,
        vec![
            ("00:00".to_string(), 0.6),
            ("04:00".to_string(), 0.4),
            ("12:00".to_string(), 0.8),
        ]
    );
}

#[rstest]
#[case(&["export", "--percentage", "150"])]
#[case(&["export", "--timeshift", "2"])]
#[case(&["normalize", "--percentage", "150"])]
fn adjusted_documents_keep_the_profile_zone(#[case] args: &[&str]) {
    let v = run(args);
    assert_eq!(v["timezone"], "Europe/Prague");
}
