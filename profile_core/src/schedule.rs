//! Evaluation surface shared by every profile source.
//!
//! Implementors only hand out their raw blocks, units, DIA, percentage and
//! timeshift; every query is a default method built on
//! [`crate::evaluator`], so all variants answer identically.

use crate::block::{Block, SECONDS_PER_HOUR, TargetBlock};
use crate::evaluator::{
    block_value_by_seconds, high_target_by_seconds, low_target_by_seconds, seconds_from_midnight,
    target_by_seconds,
};
use crate::normalizer::{shift_block, shift_target_block};
use crate::percentage::Percentage;
use crate::units::{GlucoseUnit, to_mgdl};
use chrono::{DateTime, TimeZone};
use profile_traits::WallClock;

/// A `(seconds from midnight, value)` point of a normalized schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileValue {
    pub time_as_seconds: i64,
    pub value: f64,
}

/// Pair each normalized segment with its start second.
fn values_with_starts<S>(blocks: &[S], value: impl Fn(&S) -> f64, duration: impl Fn(&S) -> u64) -> Vec<ProfileValue> {
    let mut elapsed_ms = 0u64;
    blocks
        .iter()
        .map(|b| {
            let point = ProfileValue {
                time_as_seconds: (elapsed_ms / 1000) as i64,
                value: value(b),
            };
            elapsed_ms += duration(b);
            point
        })
        .collect()
}

pub trait Schedule {
    fn basal_blocks(&self) -> &[Block];
    fn isf_blocks(&self) -> &[Block];
    fn ic_blocks(&self) -> &[Block];
    fn target_blocks(&self) -> &[TargetBlock];
    fn units(&self) -> GlucoseUnit;
    /// Duration of insulin action in hours.
    fn dia(&self) -> f64;

    fn percentage(&self) -> Percentage {
        Percentage::FULL
    }

    /// Whole-hour rotation applied on lookup.
    fn timeshift(&self) -> i32 {
        0
    }

    // ── time-of-day queries ────────────────────────────────────────────────

    fn basal_time_from_midnight(&self, seconds: i64) -> f64 {
        block_value_by_seconds(
            self.basal_blocks(),
            seconds,
            self.percentage().basal_multiplier(),
            self.timeshift(),
        )
    }

    fn ic_time_from_midnight(&self, seconds: i64) -> f64 {
        block_value_by_seconds(
            self.ic_blocks(),
            seconds,
            self.percentage().ratio_multiplier(),
            self.timeshift(),
        )
    }

    /// Sensitivity in the profile's own units.
    fn isf_time_from_midnight(&self, seconds: i64) -> f64 {
        block_value_by_seconds(
            self.isf_blocks(),
            seconds,
            self.percentage().ratio_multiplier(),
            self.timeshift(),
        )
    }

    fn isf_mgdl_time_from_midnight(&self, seconds: i64) -> f64 {
        to_mgdl(self.isf_time_from_midnight(seconds), self.units())
    }

    /// Low target in the profile's own units.
    fn target_low_time_from_midnight(&self, seconds: i64) -> f64 {
        low_target_by_seconds(self.target_blocks(), seconds, self.timeshift())
    }

    /// High target in the profile's own units.
    fn target_high_time_from_midnight(&self, seconds: i64) -> f64 {
        high_target_by_seconds(self.target_blocks(), seconds, self.timeshift())
    }

    fn target_low_mgdl_time_from_midnight(&self, seconds: i64) -> f64 {
        to_mgdl(self.target_low_time_from_midnight(seconds), self.units())
    }

    fn target_high_mgdl_time_from_midnight(&self, seconds: i64) -> f64 {
        to_mgdl(self.target_high_time_from_midnight(seconds), self.units())
    }

    fn target_mgdl_time_from_midnight(&self, seconds: i64) -> f64 {
        to_mgdl(
            target_by_seconds(self.target_blocks(), seconds, self.timeshift()),
            self.units(),
        )
    }

    // ── instant queries ────────────────────────────────────────────────────

    fn basal_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> f64
    where
        Self: Sized,
    {
        self.basal_time_from_midnight(seconds_from_midnight(at))
    }

    fn ic_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> f64
    where
        Self: Sized,
    {
        self.ic_time_from_midnight(seconds_from_midnight(at))
    }

    fn isf_mgdl_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> f64
    where
        Self: Sized,
    {
        self.isf_mgdl_time_from_midnight(seconds_from_midnight(at))
    }

    fn target_mgdl_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> f64
    where
        Self: Sized,
    {
        self.target_mgdl_time_from_midnight(seconds_from_midnight(at))
    }

    fn target_low_mgdl_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> f64
    where
        Self: Sized,
    {
        self.target_low_mgdl_time_from_midnight(seconds_from_midnight(at))
    }

    fn target_high_mgdl_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> f64
    where
        Self: Sized,
    {
        self.target_high_mgdl_time_from_midnight(seconds_from_midnight(at))
    }

    // ── "now" queries ──────────────────────────────────────────────────────

    fn basal_now(&self, clock: &impl WallClock) -> f64
    where
        Self: Sized,
    {
        self.basal_at(&clock.now())
    }

    fn ic_now(&self, clock: &impl WallClock) -> f64
    where
        Self: Sized,
    {
        self.ic_at(&clock.now())
    }

    fn isf_mgdl_now(&self, clock: &impl WallClock) -> f64
    where
        Self: Sized,
    {
        self.isf_mgdl_at(&clock.now())
    }

    fn target_mgdl_now(&self, clock: &impl WallClock) -> f64
    where
        Self: Sized,
    {
        self.target_mgdl_at(&clock.now())
    }

    fn target_low_mgdl_now(&self, clock: &impl WallClock) -> f64
    where
        Self: Sized,
    {
        self.target_low_mgdl_at(&clock.now())
    }

    fn target_high_mgdl_now(&self, clock: &impl WallClock) -> f64
    where
        Self: Sized,
    {
        self.target_high_mgdl_at(&clock.now())
    }

    // ── whole-day summaries ────────────────────────────────────────────────

    /// Structural equivalence sampled at every whole hour.
    fn is_equal(&self, other: &impl Schedule) -> bool
    where
        Self: Sized,
    {
        if self.dia() != other.dia() {
            return false;
        }
        (0..24).all(|hour| {
            let s = hour * SECONDS_PER_HOUR;
            self.basal_time_from_midnight(s) == other.basal_time_from_midnight(s)
                && self.isf_mgdl_time_from_midnight(s) == other.isf_mgdl_time_from_midnight(s)
                && self.ic_time_from_midnight(s) == other.ic_time_from_midnight(s)
                && self.target_low_mgdl_time_from_midnight(s)
                    == other.target_low_mgdl_time_from_midnight(s)
                && self.target_high_mgdl_time_from_midnight(s)
                    == other.target_high_mgdl_time_from_midnight(s)
        })
    }

    /// Largest stored (unscaled) basal amount.
    fn max_daily_basal(&self) -> f64 {
        self.basal_blocks()
            .iter()
            .map(|b| b.amount)
            .fold(None, |acc: Option<f64>, a| Some(acc.map_or(a, |m| m.max(a))))
            .unwrap_or(0.0)
    }

    /// Hourly-sampled daily basal total with the percentage taken back out.
    fn base_basal_sum(&self) -> f64 {
        let m = self.percentage().basal_multiplier();
        (0..24)
            .map(|h| self.basal_time_from_midnight(h * SECONDS_PER_HOUR) / m)
            .sum()
    }

    /// Hourly-sampled daily basal total as delivered.
    fn percentage_basal_sum(&self) -> f64 {
        (0..24)
            .map(|h| self.basal_time_from_midnight(h * SECONDS_PER_HOUR))
            .sum()
    }

    fn basal_values(&self) -> Vec<ProfileValue> {
        let shifted = shift_block(
            self.basal_blocks(),
            self.percentage().basal_multiplier(),
            self.timeshift(),
        );
        values_with_starts(&shifted, |b| b.amount, |b| b.duration)
    }

    fn ic_values(&self) -> Vec<ProfileValue> {
        let shifted = shift_block(
            self.ic_blocks(),
            self.percentage().ratio_multiplier(),
            self.timeshift(),
        );
        values_with_starts(&shifted, |b| b.amount, |b| b.duration)
    }

    fn isf_mgdl_values(&self) -> Vec<ProfileValue> {
        let units = self.units();
        let shifted = shift_block(
            self.isf_blocks(),
            self.percentage().ratio_multiplier(),
            self.timeshift(),
        );
        values_with_starts(&shifted, |b| to_mgdl(b.amount, units), |b| b.duration)
    }

    /// Midpoint of each target range, in mg/dL.
    fn single_targets_mgdl(&self) -> Vec<ProfileValue> {
        let units = self.units();
        let shifted = shift_target_block(self.target_blocks(), self.timeshift());
        values_with_starts(&shifted, |b| to_mgdl(b.midpoint(), units), |b| b.duration)
    }
}
