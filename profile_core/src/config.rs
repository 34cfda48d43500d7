//! Runtime configuration consumed by the validator.
//!
//! These are separate from the TOML-deserialized config in `profile_config`;
//! see `conversions` for the mapping.

use crate::units::round_to;

/// What the connected pump can deliver.
#[derive(Debug, Clone, PartialEq)]
pub struct PumpDescription {
    /// Pump accepts basal segments that are not whole hours.
    pub supports_sub_hour_basal: bool,
    /// Lowest programmable basal rate (U/h).
    pub basal_minimum_rate: f64,
    /// Highest programmable basal rate (U/h).
    pub basal_maximum_rate: f64,
    /// Programmable basal increment (U/h). `None` delivers any rate.
    pub basal_step: Option<f64>,
}

impl Default for PumpDescription {
    fn default() -> Self {
        Self {
            supports_sub_hour_basal: false,
            basal_minimum_rate: 0.05,
            basal_maximum_rate: 25.0,
            basal_step: None,
        }
    }
}

impl PumpDescription {
    /// Stored amount for a segment clamped to the pump `limit`.
    ///
    /// The delivered rate is snapped to `basal_step` without leaving the
    /// pump range, then divided back by the profile's basal multiplier.
    pub fn clamp_amount(&self, limit: f64, multiplier: f64) -> f64 {
        let rate = match self.basal_step {
            Some(step) if step > 0.0 => {
                let snapped = round_to(limit, step);
                if snapped < self.basal_minimum_rate {
                    snapped + step
                } else if snapped > self.basal_maximum_rate {
                    snapped - step
                } else {
                    snapped
                }
            }
            _ => limit,
        };
        rate / multiplier
    }
}

/// Absolute physiological limits. Glucose values are mg/dL regardless of
/// the profile's display units.
#[derive(Debug, Clone, PartialEq)]
pub struct HardLimits {
    pub min_dia: f64,
    pub max_dia: f64,
    pub min_ic: f64,
    pub max_ic: f64,
    pub min_isf: f64,
    pub max_isf: f64,
    /// Upper bound for any scaled basal segment; the lower bound is 0.01 U/h.
    pub max_basal: f64,
    pub target_low: (f64, f64),
    pub target_high: (f64, f64),
}

/// Lowest basal rate that counts as a real delivery.
pub const MIN_BASAL_HARD_LIMIT: f64 = 0.01;

impl Default for HardLimits {
    fn default() -> Self {
        Self {
            min_dia: 5.0,
            max_dia: 9.0,
            min_ic: 2.0,
            max_ic: 100.0,
            min_isf: 2.0,
            max_isf: 1000.0,
            max_basal: 10.0,
            target_low: (80.0, 180.0),
            target_high: (90.0, 270.0),
        }
    }
}

impl HardLimits {
    /// Inclusive range check; NaN is never in range.
    #[inline]
    pub fn is_in_range(value: f64, low: f64, high: f64) -> bool {
        value >= low && value <= high
    }
}

/// Validator behavior switches.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationCfg {
    /// Closed-loop mode; alignment problems are only notified when enabled.
    pub aps_mode: bool,
    /// Label inserted into reasons.
    pub source: String,
}

impl Default for ValidationCfg {
    fn default() -> Self {
        Self {
            aps_mode: true,
            source: "ProfileSwitch".to_string(),
        }
    }
}
