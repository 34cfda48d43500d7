//! Temporary basal overrides and extended boluses expressed as overrides.

use crate::block::HOUR_MS;
use crate::error::ProfileError;
use crate::schedule::Schedule;
use crate::timezone::local_datetime;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;

const MILLIS_PER_MINUTE: i64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TemporaryBasalType {
    #[default]
    Normal,
    EmulatedPumpSuspend,
    PumpSuspend,
    Superbolus,
    /// Extended bolus seen as a temporary basal; in memory only.
    FakeExtended,
}

impl TemporaryBasalType {
    pub const ALL: [Self; 5] = [
        Self::Normal,
        Self::EmulatedPumpSuspend,
        Self::PumpSuspend,
        Self::Superbolus,
        Self::FakeExtended,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::EmulatedPumpSuspend => "EMULATED_PUMP_SUSPEND",
            Self::PumpSuspend => "PUMP_SUSPEND",
            Self::Superbolus => "SUPERBOLUS",
            Self::FakeExtended => "FAKE_EXTENDED",
        }
    }

    /// Lenient lookup; missing or unknown names read as `Normal`.
    pub fn from_name(name: Option<&str>) -> Self {
        name.and_then(|n| Self::ALL.into_iter().find(|t| t.as_str() == n))
            .unwrap_or(Self::Normal)
    }

    pub fn is_persistable(self) -> bool {
        self != Self::FakeExtended
    }
}

impl std::fmt::Display for TemporaryBasalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TemporaryBasalType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if !self.is_persistable() {
            return Err(serde::ser::Error::custom(
                "FAKE_EXTENDED temporary basals are not persisted",
            ));
        }
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TemporaryBasalType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = Option::<String>::deserialize(deserializer)?;
        Ok(Self::from_name(name.as_deref()))
    }
}

/// Time-bounded exception to the scheduled basal.
///
/// `duration` is strictly positive; [`TemporaryBasal::new`] and
/// deserialization both refuse anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TemporaryBasalRecord")]
pub struct TemporaryBasal {
    pub id: i64,
    pub version: i32,
    pub date_created: i64,
    pub is_valid: bool,
    /// Id of the record this one supersedes.
    pub reference_id: Option<i64>,
    pub timestamp: i64,
    pub utc_offset: i64,
    #[serde(rename = "type")]
    pub kind: TemporaryBasalType,
    pub is_absolute: bool,
    /// U/h when absolute, percent of scheduled basal otherwise.
    pub rate: f64,
    duration: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemporaryBasalRecord {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    version: i32,
    #[serde(default = "unset_date")]
    date_created: i64,
    #[serde(default = "valid")]
    is_valid: bool,
    #[serde(default)]
    reference_id: Option<i64>,
    timestamp: i64,
    #[serde(default)]
    utc_offset: i64,
    #[serde(rename = "type", default)]
    kind: TemporaryBasalType,
    is_absolute: bool,
    rate: f64,
    duration: i64,
}

fn unset_date() -> i64 {
    -1
}

fn valid() -> bool {
    true
}

impl TryFrom<TemporaryBasalRecord> for TemporaryBasal {
    type Error = ProfileError;

    fn try_from(r: TemporaryBasalRecord) -> Result<Self, Self::Error> {
        let mut tb = Self::new(r.timestamp, r.kind, r.is_absolute, r.rate, r.duration)?;
        tb.id = r.id;
        tb.version = r.version;
        tb.date_created = r.date_created;
        tb.is_valid = r.is_valid;
        tb.reference_id = r.reference_id;
        tb.utc_offset = r.utc_offset;
        Ok(tb)
    }
}

impl TemporaryBasal {
    pub fn new(
        timestamp: i64,
        kind: TemporaryBasalType,
        is_absolute: bool,
        rate: f64,
        duration_ms: i64,
    ) -> Result<Self, ProfileError> {
        if duration_ms <= 0 {
            return Err(ProfileError::InvalidDuration(duration_ms));
        }
        Ok(Self {
            id: 0,
            version: 0,
            date_created: -1,
            is_valid: true,
            reference_id: None,
            timestamp,
            utc_offset: 0,
            kind,
            is_absolute,
            rate,
            duration: duration_ms,
        })
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn with_reference_id(mut self, reference_id: i64) -> Self {
        self.reference_id = Some(reference_id);
        self
    }

    pub fn with_utc_offset(mut self, utc_offset_ms: i64) -> Self {
        self.utc_offset = utc_offset_ms;
        self
    }

    #[inline]
    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// Last instant of the override (inclusive).
    #[inline]
    pub fn end(&self) -> i64 {
        self.timestamp.saturating_add(self.duration)
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration / MILLIS_PER_MINUTE
    }

    pub fn is_in_progress(&self, now_ms: i64) -> bool {
        (self.timestamp..=self.end()).contains(&now_ms)
    }

    /// Whole minutes left at `now_ms`, rounded, never negative.
    pub fn planned_remaining_minutes(&self, now_ms: i64) -> i64 {
        let left = self.end().saturating_sub(now_ms) as f64 / MILLIS_PER_MINUTE as f64;
        (left.round() as i64).max(0)
    }

    /// Rate in U/h at `at`, resolving percent overrides against `profile`.
    pub fn converted_to_absolute<Tz: TimeZone>(
        &self,
        at: &DateTime<Tz>,
        profile: &impl Schedule,
    ) -> f64 {
        if self.is_absolute {
            self.rate
        } else {
            profile.basal_at(at) * self.rate / 100.0
        }
    }

    /// Rate as percent of the scheduled basal at `at`.
    ///
    /// An absolute override against a zero basal reads as 0 %.
    pub fn converted_to_percent<Tz: TimeZone>(
        &self,
        at: &DateTime<Tz>,
        profile: &impl Schedule,
    ) -> i32 {
        if !self.is_absolute {
            return self.rate.round() as i32;
        }
        let basal = profile.basal_at(at);
        if basal > 0.0 {
            (self.rate / basal * 100.0).round() as i32
        } else {
            0
        }
    }
}

/// Bolus delivered evenly over `duration`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedBolus {
    pub id: i64,
    pub is_valid: bool,
    pub timestamp: i64,
    pub utc_offset: i64,
    /// Total insulin in U.
    pub amount: f64,
    pub duration: i64,
}

impl ExtendedBolus {
    pub fn new(timestamp: i64, amount: f64, duration_ms: i64) -> Result<Self, ProfileError> {
        if duration_ms <= 0 {
            return Err(ProfileError::InvalidDuration(duration_ms));
        }
        Ok(Self {
            id: 0,
            is_valid: true,
            timestamp,
            utc_offset: 0,
            amount,
            duration: duration_ms,
        })
    }

    pub fn with_utc_offset(mut self, utc_offset_ms: i64) -> Self {
        self.utc_offset = utc_offset_ms;
        self
    }

    /// Delivery rate in U/h.
    pub fn rate(&self) -> f64 {
        self.amount / (self.duration as f64 / HOUR_MS as f64)
    }

    /// Absolute `FakeExtended` override delivering scheduled basal plus the
    /// extended rate, evaluated at the bolus start in its own local time.
    pub fn to_temporary_basal(&self, profile: &impl Schedule) -> Result<TemporaryBasal, ProfileError> {
        let local = local_datetime(self.timestamp, self.utc_offset)?;
        let rate = profile.basal_at(&local) + self.rate();
        let mut tb = TemporaryBasal::new(
            self.timestamp,
            TemporaryBasalType::FakeExtended,
            true,
            rate,
            self.duration,
        )?;
        tb.id = self.id;
        tb.is_valid = self.is_valid;
        tb.utc_offset = self.utc_offset;
        Ok(tb)
    }
}

/// The override in force at `now_ms`: valid, not superseded by another
/// record, in progress, latest start wins.
pub fn active_temporary_basal(records: &[TemporaryBasal], now_ms: i64) -> Option<&TemporaryBasal> {
    let superseded: HashSet<i64> = records.iter().filter_map(|r| r.reference_id).collect();
    records
        .iter()
        .filter(|r| r.is_valid && !superseded.contains(&r.id))
        .filter(|r| r.is_in_progress(now_ms))
        .max_by_key(|r| r.timestamp)
}

/// Basal actually delivered at `at`: the active override if any, otherwise
/// the schedule. Both are read at the same instant.
pub fn effective_basal_rate<Tz: TimeZone>(
    profile: &impl Schedule,
    records: &[TemporaryBasal],
    at: &DateTime<Tz>,
) -> f64 {
    match active_temporary_basal(records, at.timestamp_millis()) {
        Some(tb) => {
            let rate = tb.converted_to_absolute(at, profile);
            tracing::trace!(id = tb.id, kind = %tb.kind, rate, "temporary basal overrides schedule");
            rate
        }
        None => profile.basal_at(at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, TargetBlock};
    use crate::profile::{InsulinConfiguration, ProfileSwitch, ScheduleSet};
    use crate::units::GlucoseUnit;
    use chrono::Utc;

    fn switch() -> ProfileSwitch {
        ProfileSwitch::new(
            0,
            "Base",
            ScheduleSet {
                basal_blocks: vec![Block::hours(6, 0.5), Block::hours(18, 1.0)],
                isf_blocks: vec![Block::hours(24, 50.0)],
                ic_blocks: vec![Block::hours(24, 10.0)],
                target_blocks: vec![TargetBlock::hours(24, 100.0, 110.0)],
            },
            GlucoseUnit::Mgdl,
            InsulinConfiguration::from_dia_hours(5.0),
        )
    }

    fn at_hour(h: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(h * HOUR_MS as i64).unwrap()
    }

    #[test]
    fn unknown_type_names_read_as_normal() {
        assert_eq!(TemporaryBasalType::from_name(Some("PUMP_SUSPEND")), TemporaryBasalType::PumpSuspend);
        assert_eq!(TemporaryBasalType::from_name(Some("pump_suspend")), TemporaryBasalType::Normal);
        assert_eq!(TemporaryBasalType::from_name(None), TemporaryBasalType::Normal);
    }

    #[test]
    fn fake_extended_is_never_serialized() {
        let tb = TemporaryBasal::new(0, TemporaryBasalType::FakeExtended, true, 1.0, 1).unwrap();
        assert!(serde_json::to_string(&tb).is_err());
        let tb = TemporaryBasal::new(0, TemporaryBasalType::Superbolus, true, 0.0, 1).unwrap();
        assert!(serde_json::to_string(&tb).unwrap().contains("\"type\":\"SUPERBOLUS\""));
    }

    #[test]
    fn percent_override_resolves_against_schedule() {
        let ps = switch();
        let tb = TemporaryBasal::new(0, TemporaryBasalType::Normal, false, 150.0, HOUR_MS as i64).unwrap();
        assert_eq!(tb.converted_to_absolute(&at_hour(12), &ps), 1.5);
        assert_eq!(tb.converted_to_percent(&at_hour(12), &ps), 150);

        let abs = TemporaryBasal::new(0, TemporaryBasalType::Normal, true, 0.25, HOUR_MS as i64).unwrap();
        assert_eq!(abs.converted_to_percent(&at_hour(3), &ps), 50);
    }

    #[test]
    fn remaining_minutes_round_and_floor_at_zero() {
        let tb = TemporaryBasal::new(0, TemporaryBasalType::Normal, true, 1.0, 30 * MILLIS_PER_MINUTE).unwrap();
        assert_eq!(tb.planned_remaining_minutes(0), 30);
        assert_eq!(tb.planned_remaining_minutes(10 * MILLIS_PER_MINUTE + 20_000), 20);
        assert_eq!(tb.planned_remaining_minutes(2 * HOUR_MS as i64), 0);
    }

    #[test]
    fn extended_bolus_adds_to_scheduled_basal() {
        let eb = ExtendedBolus::new(12 * HOUR_MS as i64, 2.0, 2 * HOUR_MS as i64).unwrap();
        assert_eq!(eb.rate(), 1.0);
        let tb = eb.to_temporary_basal(&switch()).unwrap();
        assert_eq!(tb.kind, TemporaryBasalType::FakeExtended);
        assert!(tb.is_absolute);
        assert_eq!(tb.rate, 2.0);
        assert_eq!(tb.duration(), 2 * HOUR_MS as i64);
    }

    #[test]
    fn superseded_and_invalid_records_are_skipped() {
        let old = TemporaryBasal::new(0, TemporaryBasalType::Normal, true, 2.0, 4 * HOUR_MS as i64)
            .unwrap()
            .with_id(1);
        let replacement = TemporaryBasal::new(0, TemporaryBasalType::Normal, true, 3.0, 4 * HOUR_MS as i64)
            .unwrap()
            .with_id(2)
            .with_reference_id(1);
        let mut cancelled = TemporaryBasal::new(HOUR_MS as i64, TemporaryBasalType::Normal, true, 9.0, HOUR_MS as i64)
            .unwrap()
            .with_id(3);
        cancelled.is_valid = false;
        let records = [old, replacement, cancelled];

        let now = HOUR_MS as i64 + 1;
        assert_eq!(active_temporary_basal(&records, now).map(|r| r.id), Some(2));
        assert_eq!(effective_basal_rate(&switch(), &records, &at_hour(1)), 3.0);
        assert_eq!(effective_basal_rate(&switch(), &records, &at_hour(5)), 0.5);
    }
}
