//! Profile sources and the [`Profile`] sum type over them.
//!
//! Three records can feed the dosing loop:
//! - [`ProfileSwitch`]: user-authored, carries percentage/timeshift/duration.
//! - [`EffectiveProfileSwitch`]: already baked, always 100 % and shift 0.
//! - [`PureProfile`]: imported raw schedule with an explicit time zone.
//!
//! [`Profile`] wraps them so evaluation never branches on the source; only
//! identity metadata (id, validity, activation window) does.

use crate::block::{Block, HOUR_MS, TargetBlock};
use crate::normalizer::{shift_block, shift_target_block};
use crate::percentage::Percentage;
use crate::schedule::Schedule;
use crate::timezone::zone_id_for_offset;
use crate::units::GlucoseUnit;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// The four daily schedules of a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSet {
    pub basal_blocks: Vec<Block>,
    pub isf_blocks: Vec<Block>,
    pub ic_blocks: Vec<Block>,
    pub target_blocks: Vec<TargetBlock>,
}

/// Insulin model parameters; DIA is derived from the end time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsulinConfiguration {
    pub insulin_label: String,
    /// Milliseconds until the insulin effect ends.
    pub insulin_end_time: u64,
    /// Milliseconds until peak activity.
    pub peak: u64,
}

impl InsulinConfiguration {
    pub fn new(insulin_label: impl Into<String>, insulin_end_time: u64, peak: u64) -> Self {
        Self {
            insulin_label: insulin_label.into(),
            insulin_end_time,
            peak,
        }
    }

    /// Configuration carrying only a DIA given in hours.
    pub fn from_dia_hours(dia: f64) -> Self {
        let end = (dia * HOUR_MS as f64).round();
        let end = if end.is_finite() && end > 0.0 { end as u64 } else { 0 };
        Self::new("", end, 0)
    }

    #[inline]
    pub fn dia_hours(&self) -> f64 {
        self.insulin_end_time as f64 / HOUR_MS as f64
    }
}

/// User-authored profile activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSwitch {
    pub id: i64,
    pub version: i32,
    pub date_created: i64,
    pub is_valid: bool,
    pub reference_id: Option<i64>,
    /// Activation instant, epoch milliseconds.
    pub timestamp: i64,
    /// Local UTC offset at activation, milliseconds.
    pub utc_offset: i64,
    #[serde(flatten)]
    pub schedules: ScheduleSet,
    pub glucose_unit: GlucoseUnit,
    pub profile_name: String,
    /// Rotation in whole hours.
    pub timeshift: i32,
    pub percentage: Percentage,
    /// How long the switch lasts in milliseconds; `None` is indefinite.
    pub duration: Option<u64>,
    pub insulin_configuration: InsulinConfiguration,
}

impl ProfileSwitch {
    pub fn new(
        timestamp: i64,
        profile_name: impl Into<String>,
        schedules: ScheduleSet,
        glucose_unit: GlucoseUnit,
        insulin_configuration: InsulinConfiguration,
    ) -> Self {
        Self {
            id: 0,
            version: 0,
            date_created: -1,
            is_valid: true,
            reference_id: None,
            timestamp,
            utc_offset: 0,
            schedules,
            glucose_unit,
            profile_name: profile_name.into(),
            timeshift: 0,
            percentage: Percentage::FULL,
            duration: None,
            insulin_configuration,
        }
    }

    /// Apply a scaling percentage; rejects `<= 0`.
    pub fn with_percentage(mut self, percentage: i32) -> Result<Self, crate::error::ProfileError> {
        self.percentage = Percentage::new(percentage)?;
        Ok(self)
    }

    pub fn with_timeshift(mut self, hours: i32) -> Self {
        self.timeshift = hours;
        self
    }

    pub fn with_duration(mut self, duration_ms: Option<u64>) -> Self {
        self.duration = duration_ms;
        self
    }

    pub fn with_utc_offset(mut self, utc_offset_ms: i64) -> Self {
        self.utc_offset = utc_offset_ms;
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    /// Wrap a raw profile as an unscaled, unshifted switch.
    pub fn from_pure(pure: &PureProfile, timestamp: i64, profile_name: impl Into<String>) -> Self {
        Self::new(
            timestamp,
            profile_name,
            pure.schedules.clone(),
            pure.glucose_unit,
            InsulinConfiguration::from_dia_hours(pure.dia),
        )
    }
}

/// Profile as it was actually applied: percentage and timeshift already
/// baked into the blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveProfileSwitch {
    pub id: i64,
    pub version: i32,
    pub date_created: i64,
    pub is_valid: bool,
    pub reference_id: Option<i64>,
    pub timestamp: i64,
    pub utc_offset: i64,
    #[serde(flatten)]
    pub schedules: ScheduleSet,
    pub glucose_unit: GlucoseUnit,
    pub original_profile_name: String,
    pub original_percentage: Percentage,
    pub original_timeshift: i32,
    pub original_duration: Option<u64>,
    pub insulin_configuration: InsulinConfiguration,
}

/// Externally supplied schedule, e.g. an import.
#[derive(Debug, Clone, PartialEq)]
pub struct PureProfile {
    pub schedules: ScheduleSet,
    pub glucose_unit: GlucoseUnit,
    /// DIA in hours.
    pub dia: f64,
    pub time_zone: Tz,
}

macro_rules! schedule_set_accessors {
    () => {
        fn basal_blocks(&self) -> &[Block] {
            &self.schedules.basal_blocks
        }
        fn isf_blocks(&self) -> &[Block] {
            &self.schedules.isf_blocks
        }
        fn ic_blocks(&self) -> &[Block] {
            &self.schedules.ic_blocks
        }
        fn target_blocks(&self) -> &[TargetBlock] {
            &self.schedules.target_blocks
        }
        fn units(&self) -> GlucoseUnit {
            self.glucose_unit
        }
    };
}

impl Schedule for ProfileSwitch {
    schedule_set_accessors!();

    fn dia(&self) -> f64 {
        self.insulin_configuration.dia_hours()
    }
    fn percentage(&self) -> Percentage {
        self.percentage
    }
    fn timeshift(&self) -> i32 {
        self.timeshift
    }
}

impl Schedule for EffectiveProfileSwitch {
    schedule_set_accessors!();

    fn dia(&self) -> f64 {
        self.insulin_configuration.dia_hours()
    }
}

impl Schedule for PureProfile {
    schedule_set_accessors!();

    fn dia(&self) -> f64 {
        self.dia
    }
}

/// Any profile source behind one evaluation surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    Switch(ProfileSwitch),
    Effective(EffectiveProfileSwitch),
    Pure(PureProfile),
}

impl From<ProfileSwitch> for Profile {
    fn from(value: ProfileSwitch) -> Self {
        Self::Switch(value)
    }
}

impl From<EffectiveProfileSwitch> for Profile {
    fn from(value: EffectiveProfileSwitch) -> Self {
        Self::Effective(value)
    }
}

impl From<PureProfile> for Profile {
    fn from(value: PureProfile) -> Self {
        Self::Pure(value)
    }
}

impl Profile {
    fn source(&self) -> &dyn Schedule {
        match self {
            Self::Switch(v) => v,
            Self::Effective(v) => v,
            Self::Pure(v) => v,
        }
    }

    fn schedules_mut(&mut self) -> &mut ScheduleSet {
        match self {
            Self::Switch(v) => &mut v.schedules,
            Self::Effective(v) => &mut v.schedules,
            Self::Pure(v) => &mut v.schedules,
        }
    }

    /// Mutable basal segments; only the validator's clamp writes here.
    pub(crate) fn basal_blocks_mut(&mut self) -> &mut [Block] {
        &mut self.schedules_mut().basal_blocks
    }

    /// Record id; raw profiles have none.
    pub fn id(&self) -> Option<i64> {
        match self {
            Self::Switch(v) => Some(v.id),
            Self::Effective(v) => Some(v.id),
            Self::Pure(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Self::Switch(v) => v.is_valid,
            Self::Effective(v) => v.is_valid,
            Self::Pure(_) => true,
        }
    }

    pub fn profile_name(&self) -> &str {
        match self {
            Self::Switch(v) => &v.profile_name,
            Self::Effective(v) => &v.original_profile_name,
            Self::Pure(_) => "",
        }
    }

    /// Activation instant (epoch ms); raw profiles are not activations.
    pub fn timestamp(&self) -> Option<i64> {
        match self {
            Self::Switch(v) => Some(v.timestamp),
            Self::Effective(v) => Some(v.timestamp),
            Self::Pure(_) => None,
        }
    }

    /// Activation length; `None` is indefinite. Effective and raw profiles
    /// are always indefinite.
    pub fn duration(&self) -> Option<u64> {
        match self {
            Self::Switch(v) => v.duration,
            Self::Effective(_) | Self::Pure(_) => None,
        }
    }

    /// Whether `now_ms` falls inside `[timestamp, timestamp + duration]`.
    ///
    /// An indefinite duration stays in progress once started. Raw profiles
    /// have no activation window and are never in progress.
    pub fn is_in_progress(&self, now_ms: i64) -> bool {
        let Some(start) = self.timestamp() else {
            return false;
        };
        if now_ms < start {
            return false;
        }
        match self.duration() {
            None => true,
            Some(d) => {
                let end = start.saturating_add(i64::try_from(d).unwrap_or(i64::MAX));
                now_ms <= end
            }
        }
    }

    /// Zone id published with exports.
    pub fn timezone_id(&self) -> String {
        match self {
            Self::Switch(v) => zone_id_for_offset(v.utc_offset, v.timestamp),
            Self::Effective(v) => zone_id_for_offset(v.utc_offset, v.timestamp),
            Self::Pure(v) => v.time_zone.name().to_string(),
        }
    }

    /// Insulin configuration as carried or derived from the raw DIA.
    pub fn insulin_configuration(&self) -> InsulinConfiguration {
        match self {
            Self::Switch(v) => v.insulin_configuration.clone(),
            Self::Effective(v) => v.insulin_configuration.clone(),
            Self::Pure(v) => InsulinConfiguration::from_dia_hours(v.dia),
        }
    }

    /// Bake percentage and timeshift into the blocks.
    pub fn to_pure_profile(&self, time_zone: Tz) -> PureProfile {
        bake(self, time_zone)
    }

    /// Record this profile as the one actually applied at `timestamp`.
    pub fn to_effective_switch(&self, timestamp: i64, utc_offset: i64) -> EffectiveProfileSwitch {
        let baked = bake(self, Tz::UTC);
        EffectiveProfileSwitch {
            id: 0,
            version: 0,
            date_created: -1,
            is_valid: true,
            reference_id: None,
            timestamp,
            utc_offset,
            schedules: baked.schedules,
            glucose_unit: self.units(),
            original_profile_name: self.profile_name().to_string(),
            original_percentage: self.percentage(),
            original_timeshift: self.timeshift(),
            original_duration: self.duration(),
            insulin_configuration: self.insulin_configuration(),
        }
    }
}

impl Schedule for Profile {
    fn basal_blocks(&self) -> &[Block] {
        self.source().basal_blocks()
    }
    fn isf_blocks(&self) -> &[Block] {
        self.source().isf_blocks()
    }
    fn ic_blocks(&self) -> &[Block] {
        self.source().ic_blocks()
    }
    fn target_blocks(&self) -> &[TargetBlock] {
        self.source().target_blocks()
    }
    fn units(&self) -> GlucoseUnit {
        self.source().units()
    }
    fn dia(&self) -> f64 {
        self.source().dia()
    }
    fn percentage(&self) -> Percentage {
        self.source().percentage()
    }
    fn timeshift(&self) -> i32 {
        self.source().timeshift()
    }
}

/// Normalize every schedule by the source's timeshift and scale it by its
/// percentage; the result evaluates identically at 100 % / shift 0.
pub fn bake(source: &impl Schedule, time_zone: Tz) -> PureProfile {
    let p = source.percentage();
    let shift = source.timeshift();
    PureProfile {
        schedules: ScheduleSet {
            basal_blocks: shift_block(source.basal_blocks(), p.basal_multiplier(), shift),
            isf_blocks: shift_block(source.isf_blocks(), p.ratio_multiplier(), shift),
            ic_blocks: shift_block(source.ic_blocks(), p.ratio_multiplier(), shift),
            target_blocks: shift_target_block(source.target_blocks(), shift),
        },
        glucose_unit: source.units(),
        dia: source.dia(),
        time_zone,
    }
}
