//! Percentage scaling of a schedule.

use crate::error::ProfileError;
use serde::{Deserialize, Serialize};

/// Strictly positive scaling percentage.
///
/// Basal scales by `p / 100`; carb ratio and sensitivity scale by `100 / p`.
/// Zero and negative values are rejected here so evaluation never divides
/// by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Percentage(u32);

impl Percentage {
    pub const FULL: Self = Self(100);

    pub fn new(value: i32) -> Result<Self, ProfileError> {
        if value <= 0 {
            return Err(ProfileError::InvalidPercentage(value));
        }
        Ok(Self(value.unsigned_abs()))
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn basal_multiplier(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    #[inline]
    pub fn ratio_multiplier(self) -> f64 {
        100.0 / f64::from(self.0)
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Self::FULL
    }
}

impl TryFrom<i32> for Percentage {
    type Error = ProfileError;
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for i32 {
    fn from(p: Percentage) -> Self {
        i32::try_from(p.0).unwrap_or(i32::MAX)
    }
}

impl std::fmt::Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}
