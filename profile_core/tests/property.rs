use profile_core::evaluator::{block_value_by_seconds, segment_index_at};
use profile_core::{Block, DAY_MS, normalize};
use proptest::prelude::*;

const DAY_SECONDS: i64 = 86_400;

// A day split at distinct whole-second cut points; values drawn from a small
// set so neighbouring segments sometimes repeat and get merged.
prop_compose! {
    fn full_day()(
        cuts in prop::collection::btree_set(1i64..DAY_SECONDS, 0..12),
        values in prop::collection::vec(prop::sample::select(vec![0.0, 0.05, 0.5, 1.0, 1.25, 3.0]), 13),
    ) -> Vec<Block> {
        let mut bounds: Vec<i64> = std::iter::once(0).chain(cuts).collect();
        bounds.push(DAY_SECONDS);
        bounds
            .windows(2)
            .zip(values)
            .map(|(w, v)| Block::new((w[1] - w[0]) as u64 * 1000, v))
            .collect()
    }
}

// Arbitrary segment lists that need not add up to a day.
prop_compose! {
    fn ragged()(
        parts in prop::collection::vec((0u64..30 * 3_600_000, 0.0f64..5.0), 1..8),
    ) -> Vec<Block> {
        parts.into_iter().map(|(d, v)| Block::new(d, v)).collect()
    }
}

fn containing_segment(blocks: &[Block], t: i64) -> usize {
    let ms = t as u64 * 1000;
    let mut start = 0u64;
    for (i, b) in blocks.iter().enumerate() {
        if ms >= start && ms < start + b.duration {
            return i;
        }
        start += b.duration;
    }
    unreachable!("full day covers every second")
}

proptest! {
    #[test]
    fn lookup_partitions_the_day(s in full_day(), t in 0i64..DAY_SECONDS) {
        prop_assert_eq!(segment_index_at(&s, t, 0), Some(containing_segment(&s, t)));
    }

    #[test]
    fn shift_law_full_day(
        s in full_day(),
        t in 0i64..DAY_SECONDS,
        shift in -48i32..48,
        scale in 0.1f64..3.0,
    ) {
        let n = normalize(&s, shift);
        prop_assert_eq!(n.iter().map(|b| b.duration).sum::<u64>(), DAY_MS);
        prop_assert_eq!(
            block_value_by_seconds(&n, t, scale, 0),
            block_value_by_seconds(&s, t, scale, shift)
        );
    }

    #[test]
    fn shift_law_ragged(s in ragged(), t in 0i64..DAY_SECONDS, shift in -30i32..30) {
        let n = normalize(&s, shift);
        prop_assert_eq!(
            block_value_by_seconds(&n, t, 1.0, 0),
            block_value_by_seconds(&s, t, 1.0, shift)
        );
    }

    #[test]
    fn normalize_is_idempotent(s in ragged(), shift in -30i32..30) {
        let once = normalize(&s, shift);
        prop_assert_eq!(normalize(&once, 0), once);
    }
}
