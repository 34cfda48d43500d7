//! `From` implementations bridging `profile_config` types to `profile_core` types.

use crate::config::{HardLimits, PumpDescription, ValidationCfg};

// ── PumpDescription ──────────────────────────────────────────────────────────

impl From<&profile_config::PumpCfg> for PumpDescription {
    fn from(c: &profile_config::PumpCfg) -> Self {
        Self {
            supports_sub_hour_basal: c.supports_sub_hour_basal,
            basal_minimum_rate: c.basal_minimum_rate,
            basal_maximum_rate: c.basal_maximum_rate,
            basal_step: c.basal_step,
        }
    }
}

// ── HardLimits ───────────────────────────────────────────────────────────────

impl From<&profile_config::HardLimitsCfg> for HardLimits {
    fn from(c: &profile_config::HardLimitsCfg) -> Self {
        Self {
            min_dia: c.min_dia,
            max_dia: c.max_dia,
            min_ic: c.min_ic,
            max_ic: c.max_ic,
            min_isf: c.min_isf_mgdl,
            max_isf: c.max_isf_mgdl,
            max_basal: c.max_basal,
            target_low: c.target_low_mgdl,
            target_high: c.target_high_mgdl,
        }
    }
}

// ── ValidationCfg ────────────────────────────────────────────────────────────

impl From<&profile_config::ValidationCfg> for ValidationCfg {
    fn from(c: &profile_config::ValidationCfg) -> Self {
        Self {
            aps_mode: c.aps_mode,
            source: c.source.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_agree_with_config_defaults() {
        let cfg = profile_config::Config::default();
        assert_eq!(PumpDescription::from(&cfg.pump), PumpDescription::default());
        assert_eq!(HardLimits::from(&cfg.hard_limits), HardLimits::default());
        assert_eq!(ValidationCfg::from(&cfg.validation), ValidationCfg::default());
    }
}
