//! Command implementations. Each returns the process exit code.

use crate::cli::{Commands, ProfileArgs};
use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use eyre::WrapErr;
use profile_core::{
    Profile, ProfileSwitch, ProfileValidator, PureProfile, Schedule, TemporaryBasal,
    TemporaryBasalType, TracingSink, effective_basal_rate, to_canonical_form, to_pure_ns_json,
};
use profile_traits::{WallClock, ZonedClock};
use serde_json::json;

/// Exit code for a profile that failed validation.
pub const EXIT_INVALID_PROFILE: i32 = 3;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// A loaded profile and the zone its wall-clock queries run in.
struct Loaded {
    profile: Profile,
    tz: Tz,
}

/// Read a Nightscout profile; wrap it in a switch when a percentage or
/// timeshift was requested.
fn load_profile(args: &ProfileArgs) -> eyre::Result<Loaded> {
    let text = std::fs::read_to_string(&args.profile)
        .wrap_err_with(|| format!("read profile {:?}", args.profile))?;
    let pure = PureProfile::from_ns_json(&text)
        .wrap_err_with(|| format!("load profile {:?}", args.profile))?;
    let tz = pure.time_zone;

    if args.percentage.is_none() && args.timeshift.is_none() {
        return Ok(Loaded {
            profile: Profile::Pure(pure),
            tz,
        });
    }

    let now = ZonedClock::new(tz).now();
    let name = args
        .profile
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let switch = ProfileSwitch::from_pure(&pure, now.timestamp_millis(), name)
        .with_percentage(args.percentage.unwrap_or(100))?
        .with_timeshift(args.timeshift.unwrap_or(0))
        .with_utc_offset(i64::from(now.offset().local_minus_utc()) * 1000);
    tracing::debug!(
        percentage = %switch.percentage,
        timeshift = switch.timeshift,
        "profile switch built"
    );
    Ok(Loaded {
        profile: Profile::Switch(switch),
        tz,
    })
}

/// Parse an RFC 3339 instant, or take "now", seen in `tz`.
fn instant(at: Option<&str>, tz: Tz) -> eyre::Result<DateTime<FixedOffset>> {
    match at {
        Some(text) => {
            let parsed = DateTime::parse_from_rfc3339(text)
                .wrap_err_with(|| format!("invalid instant {text:?}, expected RFC 3339"))?;
            Ok(parsed.with_timezone(&tz).fixed_offset())
        }
        None => Ok(ZonedClock::new(tz).now()),
    }
}

pub fn dispatch(cmd: &Commands, cfg: &profile_config::Config, json: bool) -> eyre::Result<i32> {
    match cmd {
        Commands::Eval { profile, at } => eval(profile, at.as_deref(), json),
        Commands::Validate { profile } => validate(profile, cfg, json),
        Commands::Export { profile } => export(profile),
        Commands::Normalize { profile } => normalize(profile),
        Commands::Override {
            profile,
            rate,
            percent,
            duration_min,
            start,
            at,
        } => apply_override(
            profile,
            *rate,
            *percent,
            *duration_min,
            start.as_deref(),
            at.as_deref(),
            json,
        ),
    }
}

fn eval(args: &ProfileArgs, at: Option<&str>, json: bool) -> eyre::Result<i32> {
    let Loaded { profile, tz } = load_profile(args)?;
    let at = instant(at, tz)?;

    let basal = profile.basal_at(&at);
    let ic = profile.ic_at(&at);
    let isf = profile.isf_mgdl_at(&at);
    let low = profile.target_low_mgdl_at(&at);
    let high = profile.target_high_mgdl_at(&at);
    let target = profile.target_mgdl_at(&at);

    if json {
        println!(
            "{}",
            json!({
                "at": at.to_rfc3339(),
                "basal": basal,
                "ic": ic,
                "isf_mgdl": isf,
                "target_low_mgdl": low,
                "target_high_mgdl": high,
                "target_mgdl": target,
            })
        );
    } else {
        println!("at:          {}", at.to_rfc3339());
        println!("basal:       {basal:.3} U/h");
        println!("carb ratio:  {ic:.2} g/U");
        println!("sensitivity: {isf:.1} mg/dL/U");
        println!("target:      {low:.1}-{high:.1} mg/dL (mid {target:.1})");
    }
    Ok(0)
}

fn validate(args: &ProfileArgs, cfg: &profile_config::Config, json: bool) -> eyre::Result<i32> {
    let Loaded { profile, .. } = load_profile(args)?;
    let validator = ProfileValidator::new((&cfg.pump).into(), (&cfg.hard_limits).into(), TracingSink)
        .with_config((&cfg.validation).into());
    let out = validator.validate(&profile);
    let valid = out.check.is_valid();
    let reasons = out.check.reasons();
    tracing::info!(valid, reasons = reasons.len(), "validation finished");

    if json {
        println!("{}", json!({ "valid": valid, "reasons": reasons }));
    } else if valid {
        println!("profile is valid");
    } else {
        println!("profile failed validation:");
        for r in &reasons {
            println!("  - {r}");
        }
    }
    Ok(if valid { 0 } else { EXIT_INVALID_PROFILE })
}

fn export(args: &ProfileArgs) -> eyre::Result<i32> {
    let Loaded { profile, tz } = load_profile(args)?;
    // A switch only remembers today's UTC offset; publish the document's zone.
    let mut doc = to_canonical_form(&profile);
    doc.timezone = tz.name().to_string();
    println!("{}", serde_json::to_string(&doc).wrap_err("serialize profile json")?);
    Ok(0)
}

fn normalize(args: &ProfileArgs) -> eyre::Result<i32> {
    let Loaded { profile, tz } = load_profile(args)?;
    let baked = Profile::Pure(profile.to_pure_profile(tz));
    println!("{}", to_pure_ns_json(&baked)?);
    Ok(0)
}

fn apply_override(
    args: &ProfileArgs,
    rate: f64,
    percent: bool,
    duration_min: i64,
    start: Option<&str>,
    at: Option<&str>,
    json: bool,
) -> eyre::Result<i32> {
    let Loaded { profile, tz } = load_profile(args)?;
    let at = instant(at, tz)?;
    let start = match start {
        Some(s) => instant(Some(s), tz)?,
        None => at,
    };
    let duration_ms = duration_min
        .checked_mul(MILLIS_PER_MINUTE)
        .ok_or_else(|| eyre::eyre!("override duration of {duration_min} min is too long"))?;
    let tb = TemporaryBasal::new(
        start.timestamp_millis(),
        TemporaryBasalType::Normal,
        !percent,
        rate,
        duration_ms,
    )?;

    let now_ms = at.timestamp_millis();
    let scheduled = profile.basal_at(&at);
    let effective = effective_basal_rate(&profile, std::slice::from_ref(&tb), &at);
    let active = tb.is_in_progress(now_ms);
    let remaining = tb.planned_remaining_minutes(now_ms);

    if json {
        println!(
            "{}",
            json!({
                "at": at.to_rfc3339(),
                "scheduled_basal": scheduled,
                "effective_basal": effective,
                "active": active,
                "remaining_min": remaining,
                "percent": tb.converted_to_percent(&at, &profile),
            })
        );
    } else {
        println!("at:        {}", at.to_rfc3339());
        println!("scheduled: {scheduled:.3} U/h");
        println!("effective: {effective:.3} U/h");
        if active {
            println!("override active, {remaining} min left");
        } else {
            println!("override not active");
        }
    }
    Ok(0)
}
