use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

const PROFILE: &str = r#"{
    "units": "mg/dl",
    "dia": 5,
    "timezone": "UTC",
    "sens": [{"time": "00:00", "timeAsSeconds": 0, "value": 50}],
    "carbratio": [{"time": "00:00", "timeAsSeconds": 0, "value": 10}],
    "basal": [
        {"time": "00:00", "timeAsSeconds": 0, "value": 0.5},
        {"time": "06:00", "timeAsSeconds": 21600, "value": 1.0}
    ],
    "target_low": [{"time": "00:00", "timeAsSeconds": 0, "value": 100}],
    "target_high": [{"time": "00:00", "timeAsSeconds": 0, "value": 120}]
}"#;

fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

fn cmd() -> Command {
    Command::cargo_bin("profile_cli").unwrap()
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["eval"], 2, "required", "stderr")]
#[case(&["eval", "--at", "2024-05-01T03:00:00Z", "--percentage", "150"], 0, "basal:       0.750 U/h", "stdout")]
#[case(&["eval", "--at", "2024-05-01T00:00:00Z", "--timeshift", "2"], 0, "basal:       1.000 U/h", "stdout")]
#[case(&["eval", "--percentage", "0"], 2, "Percentage 0 is not allowed", "stderr")]
#[case(&["eval", "--at", "yesterday"], 1, "RFC 3339", "stderr")]
#[case(&["validate"], 0, "profile is valid", "stdout")]
#[case(&["override", "--rate", "2.0", "--duration-min", "0"], 2, "duration", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let profile = write(&dir, "profile.json", PROFILE);

    let mut cmd = cmd();
    for a in args {
        cmd.arg(a);
    }
    if args.len() > 1 || args.first().copied() == Some("validate") {
        cmd.arg("--profile").arg(&profile);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn validate_exits_3_with_reasons() {
    let dir = tempdir().unwrap();
    let profile = write(&dir, "profile.json", PROFILE);
    let cfg = write(
        &dir,
        "cfg.toml",
        r#"
[pump]
basal_minimum_rate = 0.6
basal_maximum_rate = 25.0

[hard_limits]
target_low_mgdl = [70.0, 90.0]
"#,
    );
    cmd()
        .arg("--config")
        .arg(&cfg)
        .arg("validate")
        .arg("--profile")
        .arg(&profile)
        .assert()
        .code(3)
        .stdout(
            predicate::str::contains("Basal value replaced by minimum supported value: ProfileSwitch")
                .and(predicate::str::contains("Low target value out of hard limits: 100.00")),
        );
}

#[test]
fn validate_json_lists_reasons() {
    let dir = tempdir().unwrap();
    let profile = write(&dir, "profile.json", PROFILE);
    let out = cmd()
        .arg("--json")
        .arg("validate")
        .arg("--profile")
        .arg(&profile)
        .arg("--percentage")
        .arg("2000")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["valid"], false);
    assert_eq!(
        v["reasons"][0],
        "Basal value out of hard limits: 20.00"
    );
}

#[test]
fn invalid_config_is_explained() {
    let dir = tempdir().unwrap();
    let profile = write(&dir, "profile.json", PROFILE);
    let cfg = write(
        &dir,
        "cfg.toml",
        "[pump]\nbasal_minimum_rate = 5.0\nbasal_maximum_rate = 1.0\n",
    );
    cmd()
        .arg("--config")
        .arg(&cfg)
        .arg("export")
        .arg("--profile")
        .arg(&profile)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn override_reports_effective_rate() {
    let dir = tempdir().unwrap();
    let profile = write(&dir, "profile.json", PROFILE);
    let out = cmd()
        .arg("--json")
        .arg("override")
        .arg("--profile")
        .arg(&profile)
        .arg("--rate")
        .arg("150")
        .arg("--percent")
        .arg("--duration-min")
        .arg("60")
        .arg("--start")
        .arg("2024-05-01T12:00:00Z")
        .arg("--at")
        .arg("2024-05-01T12:30:00Z")
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["scheduled_basal"], 1.0);
    assert_eq!(v["effective_basal"], 1.5);
    assert_eq!(v["active"], true);
    assert_eq!(v["remaining_min"], 30);
    assert_eq!(v["percent"], 150);
}

#[test]
fn missing_profile_file_is_explained_as_json() {
    let out = cmd()
        .arg("--json")
        .arg("export")
        .arg("--profile")
        .arg("/definitely/not/here.json")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let v: serde_json::Value = serde_json::from_slice(&out.stderr).unwrap();
    assert_eq!(v["reason"], "Error");
    assert!(v["message"].as_str().unwrap().contains("Could not load the profile"));
}

#[test]
fn shipped_samples_validate() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..");
    cmd()
        .arg("--config")
        .arg(root.join("etc/profile_config.toml"))
        .arg("validate")
        .arg("--profile")
        .arg(root.join("etc/profile.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("profile is valid"));
}
