//! Canonical midnight-aligned form of a rotated schedule.
//!
//! `normalize(s, h)` evaluates with timeshift 0 exactly like `s` evaluates
//! with timeshift `h`, for every second of the day. The output always covers
//! exactly 24 h, has no zero-length segments and no two adjacent segments
//! with the same value, so `normalize(normalize(s, h), 0) == normalize(s, h)`.

use crate::block::{Block, DAY_MS, MILLIS_PER_SECOND, SECONDS_PER_DAY, SECONDS_PER_HOUR, Segment, TargetBlock};

/// Clip or pad a schedule so it covers exactly one day, mirroring the
/// evaluator: the tail past 24 h is dropped and a short list is padded with
/// the value of its last entry.
fn canonical_day<S: Segment>(blocks: &[S]) -> Vec<S> {
    let Some(last) = blocks.last().copied() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(blocks.len() + 1);
    let mut elapsed = 0u64;
    for block in blocks {
        if elapsed >= DAY_MS {
            break;
        }
        let d = block.duration().min(DAY_MS - elapsed);
        if d == 0 {
            continue;
        }
        out.push(block.with_duration(d));
        elapsed += d;
    }
    if elapsed < DAY_MS {
        out.push(last.with_duration(DAY_MS - elapsed));
    }
    out
}

/// Coalesce adjacent segments carrying the same value.
fn merge_equal<S: Segment>(blocks: Vec<S>) -> Vec<S> {
    let mut out: Vec<S> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match out.last_mut() {
            Some(prev) if prev.same_value(&block) => {
                *prev = prev.with_duration(prev.duration() + block.duration());
            }
            _ => out.push(block),
        }
    }
    out
}

/// Rotate a schedule by `timeshift_hours` so it restarts at midnight.
pub fn normalize<S: Segment>(blocks: &[S], timeshift_hours: i32) -> Vec<S> {
    let day = canonical_day(blocks);
    if day.is_empty() {
        return day;
    }
    // Position in the source schedule that becomes the new 00:00.
    let pivot = (-i64::from(timeshift_hours) * SECONDS_PER_HOUR).rem_euclid(SECONDS_PER_DAY) as u64
        * MILLIS_PER_SECOND;

    let mut head = Vec::with_capacity(day.len() + 1);
    let mut tail = Vec::with_capacity(day.len());
    let mut elapsed = 0u64;
    for block in day {
        let start = elapsed;
        let end = start + block.duration();
        elapsed = end;
        if end <= pivot {
            tail.push(block);
        } else if start >= pivot {
            head.push(block);
        } else {
            // Straddles the new midnight: split it.
            tail.push(block.with_duration(pivot - start));
            head.push(block.with_duration(end - pivot));
        }
    }
    head.extend(tail);
    let out = merge_equal(head);
    tracing::trace!(
        timeshift_hours,
        segments = out.len(),
        "schedule normalized"
    );
    out
}

/// Normalize and scale scalar blocks in one go (used when baking a profile).
pub fn shift_block(blocks: &[Block], multiplier: f64, timeshift_hours: i32) -> Vec<Block> {
    let scaled: Vec<Block> = normalize(blocks, timeshift_hours)
        .into_iter()
        .map(|b| Block::new(b.duration, b.amount * multiplier))
        .collect();
    merge_equal(scaled)
}

/// Normalize target blocks; targets are never scaled.
pub fn shift_target_block(blocks: &[TargetBlock], timeshift_hours: i32) -> Vec<TargetBlock> {
    normalize(blocks, timeshift_hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::HOUR_MS;

    #[test]
    fn rotation_splits_straddling_segment() {
        let s = vec![Block::hours(6, 0.5), Block::hours(18, 1.0)];
        let n = normalize(&s, 2);
        // New midnight is old 22:00: 2 h of 1.0, then 6 h of 0.5, then 16 h of 1.0.
        assert_eq!(
            n,
            vec![Block::hours(2, 1.0), Block::hours(6, 0.5), Block::hours(16, 1.0)]
        );
    }

    #[test]
    fn zero_shift_merges_and_pads() {
        let s = vec![
            Block::hours(4, 1.0),
            Block::new(0, 7.0),
            Block::hours(4, 1.0),
            Block::hours(4, 2.0),
        ];
        let n = normalize(&s, 0);
        assert_eq!(n, vec![Block::hours(8, 1.0), Block::hours(16, 2.0)]);
    }

    #[test]
    fn over_long_schedule_is_clipped() {
        let s = vec![Block::hours(20, 1.0), Block::hours(10, 2.0)];
        let n = normalize(&s, 0);
        assert_eq!(n, vec![Block::hours(20, 1.0), Block::hours(4, 2.0)]);
        assert_eq!(n.iter().map(|b| b.duration).sum::<u64>(), 24 * HOUR_MS);
    }

    #[test]
    fn empty_stays_empty() {
        assert!(normalize::<Block>(&[], 5).is_empty());
    }

    #[test]
    fn shift_block_scales() {
        let s = vec![Block::hours(12, 1.0), Block::hours(12, 2.0)];
        let n = shift_block(&s, 0.5, 0);
        assert_eq!(n, vec![Block::hours(12, 0.5), Block::hours(12, 1.0)]);
    }
}
