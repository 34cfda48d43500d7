use thiserror::Error;

/// Construction and configuration errors.
///
/// Validation problems are not errors; they are reported as
/// [`crate::validator::ValidityCheck`] data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileError {
    #[error("percentage must be > 0, got {0}")]
    InvalidPercentage(i32),
    #[error("duration must be > 0 ms, got {0}")]
    InvalidDuration(i64),
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),
    #[error("unknown glucose units: {0:?}")]
    UnknownUnits(String),
    #[error("unknown time zone: {0:?}")]
    UnknownTimezone(String),
    #[error("utc offset out of range: {0} ms")]
    InvalidOffset(i64),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
