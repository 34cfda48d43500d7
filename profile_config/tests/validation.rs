use profile_config::{load_file, load_toml};
use rstest::rstest;
use std::fs;

#[test]
fn rejects_inverted_pump_basal_range() {
    let toml = r#"
[pump]
supports_sub_hour_basal = true
basal_minimum_rate = 2.0
basal_maximum_rate = 1.0
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject min >= max");
    assert!(
        format!("{err}")
            .to_lowercase()
            .contains("basal_minimum_rate must be < pump.basal_maximum_rate")
    );
}

#[test]
fn accepts_full_config() {
    let toml = r#"
[pump]
supports_sub_hour_basal = false
basal_minimum_rate = 0.02
basal_maximum_rate = 15.0
basal_step = 0.01

[hard_limits]
min_dia = 5.0
max_dia = 9.0
min_ic = 2.0
max_ic = 100.0
min_isf_mgdl = 2.0
max_isf_mgdl = 1000.0
max_basal = 12.0
target_low_mgdl = [70.0, 100.0]
target_high_mgdl = [130.0, 180.0]

[validation]
aps_mode = false
source = "Import"

[logging]
level = "debug"
rotation = "hourly"
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert!(!cfg.validation.aps_mode);
    assert_eq!(cfg.pump.basal_step, Some(0.01));
}

#[rstest]
#[case("[hard_limits]\nmin_dia = 0.0", "min_dia must be > 0")]
#[case("[hard_limits]\nmin_ic = 50.0\nmax_ic = 10.0", "hard_limits.ic range is inverted")]
#[case("[hard_limits]\ntarget_low_mgdl = [200.0, 100.0]", "target_low_mgdl range is inverted")]
#[case("[hard_limits]\nmax_basal = 0.0", "max_basal must be > 0")]
#[case("[validation]\nsource = \"  \"", "source must not be empty")]
#[case("[logging]\nrotation = \"weekly\"", "logging.rotation must be one of")]
fn rejects_bad_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "expected {needle:?} in {err}"
    );
}

#[test]
fn load_file_reports_path_on_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[pump\nbasal_minimum_rate = 1").unwrap();
    let err = load_file(&path).expect_err("broken TOML");
    assert!(format!("{err}").contains("parse config"));
}

#[test]
fn shipped_sample_config_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../etc/profile_config.toml");
    let cfg = load_file(&path).expect("sample config loads");
    cfg.validate().expect("sample config validates");
    assert_eq!(cfg.logging.rotation.as_deref(), Some("never"));
}
