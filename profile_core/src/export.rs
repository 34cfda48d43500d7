//! Nightscout-style profile documents.
//!
//! Export samples each schedule at the whole-hour start of every stored
//! segment, so sub-hour segments are under-sampled. Consumers depend on the
//! exact field names and order.

use crate::block::{Block, MILLIS_PER_SECOND, SECONDS_PER_DAY, SECONDS_PER_HOUR, TargetBlock};
use crate::error::{ProfileError, Result};
use crate::profile::{Profile, PureProfile, ScheduleSet};
use crate::schedule::Schedule;
use crate::timezone::parse_tz;
use crate::units::GlucoseUnit;
use eyre::WrapErr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NsEntry {
    pub time: String,
    #[serde(rename = "timeAsSeconds")]
    pub time_as_seconds: i64,
    pub value: f64,
}

impl NsEntry {
    fn at_hour(hour: i64, value: f64) -> Self {
        Self {
            time: format!("{hour:02}:00"),
            time_as_seconds: hour * SECONDS_PER_HOUR,
            value,
        }
    }
}

/// Canonical, midnight-aligned snapshot of a profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NsProfileJson {
    pub units: String,
    pub dia: f64,
    pub timezone: String,
    pub sens: Vec<NsEntry>,
    pub carbratio: Vec<NsEntry>,
    pub basal: Vec<NsEntry>,
    pub target_low: Vec<NsEntry>,
    pub target_high: Vec<NsEntry>,
}

/// Whole hours at which each stored segment starts; every segment's
/// duration is floored to hours on its own.
fn sample_hours(durations: impl Iterator<Item = u64>) -> Vec<i64> {
    let mut elapsed = 0i64;
    durations
        .map(|d| {
            let hour = elapsed;
            elapsed += (d / (SECONDS_PER_HOUR as u64 * MILLIS_PER_SECOND)) as i64;
            hour
        })
        .collect()
}

fn sample(hours: &[i64], value: impl Fn(i64) -> f64) -> Vec<NsEntry> {
    hours
        .iter()
        .map(|&h| NsEntry::at_hour(h, value(h * SECONDS_PER_HOUR)))
        .collect()
}

/// Scaled, shifted snapshot with sensitivity and targets in profile units.
pub fn to_canonical_form(profile: &Profile) -> NsProfileJson {
    let isf_hours = sample_hours(profile.isf_blocks().iter().map(|b| b.duration));
    let ic_hours = sample_hours(profile.ic_blocks().iter().map(|b| b.duration));
    let basal_hours = sample_hours(profile.basal_blocks().iter().map(|b| b.duration));
    let target_hours = sample_hours(profile.target_blocks().iter().map(|b| b.duration));

    NsProfileJson {
        units: profile.units().as_text().to_string(),
        dia: profile.dia(),
        timezone: profile.timezone_id(),
        sens: sample(&isf_hours, |s| profile.isf_time_from_midnight(s)),
        carbratio: sample(&ic_hours, |s| profile.ic_time_from_midnight(s)),
        basal: sample(&basal_hours, |s| profile.basal_time_from_midnight(s)),
        target_low: sample(&target_hours, |s| profile.target_low_time_from_midnight(s)),
        target_high: sample(&target_hours, |s| profile.target_high_time_from_midnight(s)),
    }
}

/// Canonical form as JSON text, keys in wire order.
pub fn to_pure_ns_json(profile: &Profile) -> Result<String> {
    serde_json::to_string(&to_canonical_form(profile)).wrap_err("serialize profile json")
}

// ── import ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    time: Option<String>,
    time_as_seconds: Option<i64>,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    units: String,
    dia: f64,
    #[serde(default)]
    timezone: Option<String>,
    sens: Vec<RawEntry>,
    carbratio: Vec<RawEntry>,
    basal: Vec<RawEntry>,
    target_low: Vec<RawEntry>,
    target_high: Vec<RawEntry>,
}

fn parse_clock(text: &str) -> Option<i64> {
    let (h, m) = text.trim().split_once(':')?;
    let h: i64 = h.parse().ok()?;
    let m: i64 = m.parse().ok()?;
    ((0..24).contains(&h) && (0..60).contains(&m)).then_some(h * SECONDS_PER_HOUR + m * 60)
}

impl RawEntry {
    /// `timeAsSeconds` wins over `time`.
    fn start_seconds(&self, key: &str) -> std::result::Result<i64, ProfileError> {
        let start = match (self.time_as_seconds, self.time.as_deref()) {
            (Some(s), _) => Some(s),
            (None, Some(t)) => parse_clock(t),
            (None, None) => None,
        };
        match start {
            Some(s) if (0..SECONDS_PER_DAY).contains(&s) => Ok(s),
            _ => Err(ProfileError::InvalidSchedule(format!(
                "{key}: entry has no valid start time"
            ))),
        }
    }
}

/// Sorted `(start_seconds, value)` pairs with per-segment durations in ms.
fn starts_and_durations(
    key: &str,
    entries: &[RawEntry],
) -> std::result::Result<Vec<(i64, u64, f64)>, ProfileError> {
    if entries.is_empty() {
        return Err(ProfileError::InvalidSchedule(format!("{key} is empty")));
    }
    let mut points = entries
        .iter()
        .map(|e| e.start_seconds(key).map(|s| (s, e.value)))
        .collect::<std::result::Result<Vec<_>, ProfileError>>()?;
    points.sort_by_key(|(s, _)| *s);

    if points[0].0 != 0 {
        return Err(ProfileError::InvalidSchedule(format!(
            "{key}: first entry must start at 00:00"
        )));
    }
    if points.windows(2).any(|w| w[0].0 == w[1].0) {
        return Err(ProfileError::InvalidSchedule(format!(
            "{key}: duplicate start time"
        )));
    }

    let ends = points.iter().skip(1).map(|(s, _)| *s).chain([SECONDS_PER_DAY]);
    Ok(points
        .iter()
        .zip(ends)
        .map(|(&(start, value), end)| (start, (end - start) as u64 * MILLIS_PER_SECOND, value))
        .collect())
}

fn blocks(key: &str, entries: &[RawEntry]) -> std::result::Result<Vec<Block>, ProfileError> {
    Ok(starts_and_durations(key, entries)?
        .into_iter()
        .map(|(_, duration, value)| Block::new(duration, value))
        .collect())
}

fn target_blocks(
    low: &[RawEntry],
    high: &[RawEntry],
) -> std::result::Result<Vec<TargetBlock>, ProfileError> {
    let low = starts_and_durations("target_low", low)?;
    let high = starts_and_durations("target_high", high)?;
    if low.len() != high.len() || low.iter().zip(&high).any(|(l, h)| l.0 != h.0) {
        return Err(ProfileError::InvalidSchedule(
            "target_low and target_high must share start times".to_string(),
        ));
    }
    Ok(low
        .into_iter()
        .zip(high)
        .map(|((_, duration, l), (_, _, h))| TargetBlock::new(duration, l, h))
        .collect())
}

impl PureProfile {
    /// Parse a Nightscout profile document.
    ///
    /// Entries may come in any order; the first must start at 00:00 and the
    /// last runs to midnight. A missing `timezone` means UTC.
    pub fn from_ns_json(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text).wrap_err("parse profile json")?;
        Self::from_ns_value(value)
    }

    pub fn from_ns_value(value: serde_json::Value) -> Result<Self> {
        let raw: RawProfile = serde_json::from_value(value).wrap_err("read profile document")?;
        let glucose_unit = GlucoseUnit::from_text(&raw.units)?;
        let time_zone = match raw.timezone.as_deref() {
            Some(tz) => parse_tz(tz)?,
            None => chrono_tz::Tz::UTC,
        };
        if !(raw.dia.is_finite() && raw.dia > 0.0) {
            eyre::bail!("dia must be a positive number of hours, got {}", raw.dia);
        }
        let schedules = ScheduleSet {
            basal_blocks: blocks("basal", &raw.basal)?,
            isf_blocks: blocks("sens", &raw.sens)?,
            ic_blocks: blocks("carbratio", &raw.carbratio)?,
            target_blocks: target_blocks(&raw.target_low, &raw.target_high)?,
        };
        tracing::debug!(
            units = %glucose_unit,
            tz = %time_zone.name(),
            basal_segments = schedules.basal_blocks.len(),
            "imported profile"
        );
        Ok(Self {
            schedules,
            glucose_unit,
            dia: raw.dia,
            time_zone,
        })
    }
}
