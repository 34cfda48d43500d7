//! Point-in-time lookup over a daily schedule.
//!
//! All functions here are pure: they never fail, never mutate, and may be
//! called from any number of threads at once.

use crate::block::{
    Block, MILLIS_PER_SECOND, SECONDS_PER_DAY, SECONDS_PER_HOUR, Segment, TargetBlock,
};
use chrono::{DateTime, TimeZone, Timelike};

/// Rotate a time-of-day by `timeshift_hours` into the schedule's own frame.
///
/// `effective = (seconds - timeshift * 3600) mod 86400`, always in `[0, 86400)`.
#[inline]
pub fn shifted_seconds(seconds_from_midnight: i64, timeshift_hours: i32) -> i64 {
    (seconds_from_midnight - i64::from(timeshift_hours) * SECONDS_PER_HOUR)
        .rem_euclid(SECONDS_PER_DAY)
}

/// Local time-of-day of an instant, in seconds.
#[inline]
pub fn seconds_from_midnight<Tz: TimeZone>(at: &DateTime<Tz>) -> i64 {
    i64::from(at.num_seconds_from_midnight())
}

/// Index of the segment active at `seconds_from_midnight` after rotation.
///
/// Segments cover the half-open interval `[start, start + duration)`. When the
/// list is shorter than a day the last segment answers for the remainder.
/// Returns `None` only for an empty list.
pub fn segment_index_at<S: Segment>(
    blocks: &[S],
    seconds_from_midnight: i64,
    timeshift_hours: i32,
) -> Option<usize> {
    if blocks.is_empty() {
        return None;
    }
    let requested_ms = shifted_seconds(seconds_from_midnight, timeshift_hours) as u64 * MILLIS_PER_SECOND;
    let mut elapsed = 0u64;
    for (idx, block) in blocks.iter().enumerate() {
        let end = elapsed.saturating_add(block.duration());
        if end > requested_ms {
            return Some(idx);
        }
        elapsed = end;
    }
    Some(blocks.len() - 1)
}

/// Segment active at the given time-of-day, if any.
#[inline]
pub fn segment_at<S: Segment>(
    blocks: &[S],
    seconds_from_midnight: i64,
    timeshift_hours: i32,
) -> Option<&S> {
    segment_index_at(blocks, seconds_from_midnight, timeshift_hours).map(|i| &blocks[i])
}

/// Scaled scalar value at the given time-of-day. Empty schedules yield `0.0`.
pub fn block_value_by_seconds(
    blocks: &[Block],
    seconds_from_midnight: i64,
    multiplier: f64,
    timeshift_hours: i32,
) -> f64 {
    segment_at(blocks, seconds_from_midnight, timeshift_hours)
        .map_or(0.0, |b| b.amount * multiplier)
}

/// Scaled scalar value at an absolute instant, projected into its local
/// time-of-day.
pub fn block_value_at<Tz: TimeZone>(
    blocks: &[Block],
    at: &DateTime<Tz>,
    multiplier: f64,
    timeshift_hours: i32,
) -> f64 {
    block_value_by_seconds(blocks, seconds_from_midnight(at), multiplier, timeshift_hours)
}

/// `(low, high)` at the given time-of-day. Empty schedules yield `(0.0, 0.0)`.
pub fn target_range_by_seconds(
    blocks: &[TargetBlock],
    seconds_from_midnight: i64,
    timeshift_hours: i32,
) -> (f64, f64) {
    segment_at(blocks, seconds_from_midnight, timeshift_hours).map_or((0.0, 0.0), |b| (b.low, b.high))
}

pub fn low_target_by_seconds(
    blocks: &[TargetBlock],
    seconds_from_midnight: i64,
    timeshift_hours: i32,
) -> f64 {
    target_range_by_seconds(blocks, seconds_from_midnight, timeshift_hours).0
}

pub fn high_target_by_seconds(
    blocks: &[TargetBlock],
    seconds_from_midnight: i64,
    timeshift_hours: i32,
) -> f64 {
    target_range_by_seconds(blocks, seconds_from_midnight, timeshift_hours).1
}

/// Midpoint of the active target range.
pub fn target_by_seconds(
    blocks: &[TargetBlock],
    seconds_from_midnight: i64,
    timeshift_hours: i32,
) -> f64 {
    let (low, high) = target_range_by_seconds(blocks, seconds_from_midnight, timeshift_hours);
    (low + high) / 2.0
}
