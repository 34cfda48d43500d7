//! Human-readable error descriptions and structured JSON error formatting.

use profile_core::ProfileError;

/// Stable name of a typed error, used as `reason` in JSON output.
fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<ProfileError>() {
        Some(ProfileError::InvalidPercentage(_)) => "InvalidPercentage",
        Some(ProfileError::InvalidDuration(_)) => "InvalidDuration",
        Some(ProfileError::InvalidSchedule(_)) => "InvalidSchedule",
        Some(ProfileError::UnknownUnits(_)) => "UnknownUnits",
        Some(ProfileError::UnknownTimezone(_)) => "UnknownTimezone",
        Some(ProfileError::InvalidOffset(_)) => "InvalidOffset",
        None => "Error",
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(pe) = err.downcast_ref::<ProfileError>() {
        return match pe {
            ProfileError::InvalidPercentage(p) => format!(
                "What happened: Percentage {p} is not allowed.\nLikely causes: --percentage was zero or negative.\nHow to fix: Pass a percentage greater than 0 (100 leaves the profile unchanged)."
            ),
            ProfileError::InvalidDuration(d) => format!(
                "What happened: Override duration of {d} ms is not allowed.\nLikely causes: --duration-min was zero or negative.\nHow to fix: Pass a duration of at least one minute."
            ),
            ProfileError::InvalidSchedule(msg) => format!(
                "What happened: The profile document has a malformed schedule ({msg}).\nLikely causes: Missing 00:00 entry, duplicate start times, or target_low/target_high that do not line up.\nHow to fix: Edit the profile JSON so every list starts at 00:00 with unique start times."
            ),
            ProfileError::UnknownUnits(u) => format!(
                "What happened: Unknown glucose units {u:?}.\nLikely causes: Typo in the profile's \"units\" field.\nHow to fix: Use \"mg/dl\" or \"mmol\"."
            ),
            ProfileError::UnknownTimezone(tz) => format!(
                "What happened: Unknown time zone {tz:?}.\nLikely causes: The profile's \"timezone\" is not an IANA zone id.\nHow to fix: Use an id such as \"Europe/Prague\" or \"UTC\"."
            ),
            ProfileError::InvalidOffset(ms) => format!(
                "What happened: UTC offset of {ms} ms is out of range.\nLikely causes: Corrupt record.\nHow to fix: Offsets must be within +/-24 h."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") || lower.contains("parse config") {
        return format!(
            "What happened: Could not load the configuration ({msg}).\nLikely causes: Wrong --config path or invalid TOML.\nHow to fix: Check the path and the TOML syntax, then rerun."
        );
    }

    if lower.contains("invalid configuration") {
        let cause = err.root_cause();
        return format!(
            "What happened: Invalid configuration ({cause}).\nLikely causes: Out-of-range or inverted values in the TOML.\nHow to fix: Edit the config file, then rerun."
        );
    }

    if lower.contains("read profile") || lower.contains("load profile") {
        let cause = err.root_cause();
        return format!(
            "What happened: Could not load the profile ({cause}).\nLikely causes: Wrong --profile path or a document that is not Nightscout profile JSON.\nHow to fix: Check the path and that the file has units, dia, sens, carbratio, basal, target_low and target_high."
        );
    }

    if lower.contains("invalid instant") {
        return format!(
            "What happened: {msg}.\nHow to fix: Use a timestamp like 2024-05-01T12:00:00+02:00."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Bad command-line values exit with 2, like clap usage errors; everything else with 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<ProfileError>() {
        Some(ProfileError::InvalidPercentage(_) | ProfileError::InvalidDuration(_)) => 2,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}
