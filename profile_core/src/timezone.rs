//! Instant ↔ local-time helpers.

use crate::error::ProfileError;
use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use chrono_tz::Tz;

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Parse an IANA zone id ("Europe/Prague", "UTC").
pub fn parse_tz(name: &str) -> Result<Tz, ProfileError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ProfileError::UnknownTimezone(name.to_string()))
}

/// Fixed offset for a UTC offset given in milliseconds.
pub fn fixed_offset(utc_offset_ms: i64) -> Result<FixedOffset, ProfileError> {
    i32::try_from(utc_offset_ms / 1000)
        .ok()
        .and_then(FixedOffset::east_opt)
        .ok_or(ProfileError::InvalidOffset(utc_offset_ms))
}

/// Epoch-millisecond instant seen in a fixed local offset.
pub fn local_datetime(
    timestamp_ms: i64,
    utc_offset_ms: i64,
) -> Result<DateTime<FixedOffset>, ProfileError> {
    let offset = fixed_offset(utc_offset_ms)?;
    offset
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .ok_or(ProfileError::InvalidOffset(utc_offset_ms))
}

/// Zone id to publish for a record that only knows its UTC offset.
///
/// Whole-hour offsets map to the `Etc/GMT` family (note the inverted sign),
/// anything else to the first IANA zone observing that offset at `at_ms`.
/// Falls back to `"UTC"`.
pub fn zone_id_for_offset(utc_offset_ms: i64, at_ms: i64) -> String {
    if utc_offset_ms == 0 {
        return "UTC".to_string();
    }
    if utc_offset_ms % MILLIS_PER_HOUR == 0 {
        let hours = utc_offset_ms / MILLIS_PER_HOUR;
        if (-12..=14).contains(&hours) {
            // Etc/GMT-2 is UTC+2.
            let sign = if hours > 0 { '-' } else { '+' };
            return format!("Etc/GMT{sign}{}", hours.abs());
        }
    }
    let Some(instant) = DateTime::<Utc>::from_timestamp_millis(at_ms) else {
        return "UTC".to_string();
    };
    let target = utc_offset_ms / 1000;
    chrono_tz::TZ_VARIANTS
        .iter()
        .find(|tz| {
            i64::from(tz.offset_from_utc_datetime(&instant.naive_utc()).fix().local_minus_utc())
                == target
        })
        .map_or_else(|| "UTC".to_string(), |tz| tz.name().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_hour_offsets_use_etc_zones() {
        assert_eq!(zone_id_for_offset(0, 0), "UTC");
        assert_eq!(zone_id_for_offset(2 * MILLIS_PER_HOUR, 0), "Etc/GMT-2");
        assert_eq!(zone_id_for_offset(-5 * MILLIS_PER_HOUR, 0), "Etc/GMT+5");
        // Every Etc id we publish must parse back.
        assert!(parse_tz(&zone_id_for_offset(9 * MILLIS_PER_HOUR, 0)).is_ok());
    }

    #[test]
    fn fractional_offset_finds_a_real_zone() {
        // +05:30 (India) has no Etc equivalent.
        let id = zone_id_for_offset(19_800_000, 1_700_000_000_000);
        assert_ne!(id, "UTC");
        let tz = parse_tz(&id).unwrap();
        let at = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap();
        assert_eq!(tz.offset_from_utc_datetime(&at.naive_utc()).fix().local_minus_utc(), 19_800);
    }

    #[test]
    fn local_datetime_applies_offset() {
        let dt = local_datetime(0, 3 * MILLIS_PER_HOUR).unwrap();
        assert_eq!(dt.to_rfc3339(), "1970-01-01T03:00:00+03:00");
        assert!(fixed_offset(30 * MILLIS_PER_HOUR).is_err());
    }
}
