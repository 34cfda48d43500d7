//! Piecewise-constant daily schedules.
//!
//! A schedule is an ordered list of segments, each lasting `duration`
//! milliseconds, laid end to end from local midnight. Lists are expected to
//! cover exactly 24 h but the evaluator tolerates shorter lists (the last
//! segment repeats) and longer ones (the tail past 24 h is never reached).

use serde::{Deserialize, Serialize};

pub const MILLIS_PER_SECOND: u64 = 1_000;
pub const SECONDS_PER_HOUR: i64 = 3_600;
pub const SECONDS_PER_DAY: i64 = 86_400;
pub const HOUR_MS: u64 = 3_600_000;
pub const DAY_MS: u64 = 86_400_000;

/// Scalar segment (basal U/h, IC g/U, ISF per U).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Length in milliseconds.
    pub duration: u64,
    pub amount: f64,
}

impl Block {
    pub fn new(duration: u64, amount: f64) -> Self {
        Self { duration, amount }
    }

    /// Segment of whole hours.
    pub fn hours(hours: u64, amount: f64) -> Self {
        Self::new(hours * HOUR_MS, amount)
    }
}

/// Range segment for glucose targets. `low <= high` is expected but only
/// enforced by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetBlock {
    /// Length in milliseconds.
    pub duration: u64,
    #[serde(rename = "lowTarget")]
    pub low: f64,
    #[serde(rename = "highTarget")]
    pub high: f64,
}

impl TargetBlock {
    pub fn new(duration: u64, low: f64, high: f64) -> Self {
        Self {
            duration,
            low,
            high,
        }
    }

    pub fn hours(hours: u64, low: f64, high: f64) -> Self {
        Self::new(hours * HOUR_MS, low, high)
    }

    #[inline]
    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

/// Common shape of both segment flavors, so lookup and normalization are
/// written once.
pub trait Segment: Copy {
    fn duration(&self) -> u64;
    fn with_duration(self, duration: u64) -> Self;
    /// Same carried value(s), ignoring duration.
    fn same_value(&self, other: &Self) -> bool;
}

impl Segment for Block {
    #[inline]
    fn duration(&self) -> u64 {
        self.duration
    }
    #[inline]
    fn with_duration(self, duration: u64) -> Self {
        Self { duration, ..self }
    }
    #[inline]
    fn same_value(&self, other: &Self) -> bool {
        self.amount == other.amount
    }
}

impl Segment for TargetBlock {
    #[inline]
    fn duration(&self) -> u64 {
        self.duration
    }
    #[inline]
    fn with_duration(self, duration: u64) -> Self {
        Self { duration, ..self }
    }
    #[inline]
    fn same_value(&self, other: &Self) -> bool {
        self.low == other.low && self.high == other.high
    }
}

/// Sum of all segment durations in milliseconds (saturating).
pub fn total_duration<S: Segment>(blocks: &[S]) -> u64 {
    blocks
        .iter()
        .fold(0u64, |acc, b| acc.saturating_add(b.duration()))
}

/// Start offset (ms from midnight) of every segment, in order.
pub fn segment_starts<S: Segment>(blocks: &[S]) -> Vec<u64> {
    let mut elapsed = 0u64;
    blocks
        .iter()
        .map(|b| {
            let start = elapsed;
            elapsed = elapsed.saturating_add(b.duration());
            start
        })
        .collect()
}
