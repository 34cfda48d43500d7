//! Glucose units and conversions.

use crate::error::ProfileError;
use serde::{Deserialize, Serialize};

pub const MMOLL_TO_MGDL: f64 = 18.0;
pub const MGDL_TO_MMOLL: f64 = 1.0 / MMOLL_TO_MGDL;

/// Units a schedule's ISF and target values are authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GlucoseUnit {
    #[default]
    Mgdl,
    Mmol,
}

impl GlucoseUnit {
    /// Wire text used by the NS profile document.
    pub fn as_text(self) -> &'static str {
        match self {
            Self::Mgdl => "mg/dl",
            Self::Mmol => "mmol",
        }
    }

    /// Parse NS wire text; case-insensitive, accepts "mmol/l" and "mg/dL".
    pub fn from_text(s: &str) -> Result<Self, ProfileError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mg/dl" | "mgdl" => Ok(Self::Mgdl),
            "mmol" | "mmol/l" | "mmoll" => Ok(Self::Mmol),
            _ => Err(ProfileError::UnknownUnits(s.to_string())),
        }
    }
}

impl std::fmt::Display for GlucoseUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_text())
    }
}

/// Convert a value in `units` to mg/dL.
#[inline]
pub fn to_mgdl(value: f64, units: GlucoseUnit) -> f64 {
    match units {
        GlucoseUnit::Mgdl => value,
        GlucoseUnit::Mmol => value * MMOLL_TO_MGDL,
    }
}

/// Convert a value in `units` to mmol/L.
#[inline]
pub fn to_mmol(value: f64, units: GlucoseUnit) -> f64 {
    match units {
        GlucoseUnit::Mgdl => value * MGDL_TO_MMOLL,
        GlucoseUnit::Mmol => value,
    }
}

/// Round `x` to the nearest multiple of `step`. A non-positive step returns `x`.
#[inline]
pub fn round_to(x: f64, step: f64) -> f64 {
    if step <= 0.0 || !step.is_finite() {
        return x;
    }
    (x / step).round() * step
}
