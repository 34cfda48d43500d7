#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas for the profile engine.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section is optional; missing keys fall back to adult hard limits
//!   and a conservative pump description.
use serde::Deserialize;
use serde::de::Deserializer;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PumpCfg {
    /// Pump accepts basal segments shorter than one hour (e.g. 30 min).
    pub supports_sub_hour_basal: bool,
    /// Lowest programmable basal rate (U/h).
    pub basal_minimum_rate: f64,
    /// Highest programmable basal rate (U/h).
    pub basal_maximum_rate: f64,
    /// Programmable basal increment (U/h); clamped rates are snapped to it.
    pub basal_step: Option<f64>,
}

impl Default for PumpCfg {
    fn default() -> Self {
        Self {
            supports_sub_hour_basal: false,
            basal_minimum_rate: 0.05,
            basal_maximum_rate: 25.0,
            basal_step: None,
        }
    }
}

/// Absolute physiological limits. Glucose-valued limits are always mg/dL.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HardLimitsCfg {
    pub min_dia: f64,
    pub max_dia: f64,
    pub min_ic: f64,
    pub max_ic: f64,
    pub min_isf_mgdl: f64,
    pub max_isf_mgdl: f64,
    pub max_basal: f64,
    /// Accepts either `[lo, hi]` or `{ min = lo, max = hi }`.
    #[serde(deserialize_with = "de_range")]
    pub target_low_mgdl: (f64, f64),
    #[serde(deserialize_with = "de_range")]
    pub target_high_mgdl: (f64, f64),
}

impl Default for HardLimitsCfg {
    fn default() -> Self {
        Self {
            min_dia: 5.0,
            max_dia: 9.0,
            min_ic: 2.0,
            max_ic: 100.0,
            min_isf_mgdl: 2.0,
            max_isf_mgdl: 1000.0,
            max_basal: 10.0,
            target_low_mgdl: (80.0, 180.0),
            target_high_mgdl: (90.0, 270.0),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ValidationCfg {
    /// Closed-loop mode; alignment problems are only notified when enabled.
    pub aps_mode: bool,
    /// Label inserted into validation reasons ("Basal values not aligned to hours: <source>").
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

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub pump: PumpCfg,
    #[serde(default)]
    pub hard_limits: HardLimitsCfg,
    #[serde(default)]
    pub validation: ValidationCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read and parse a config file.
pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RangeToml {
    Tuple((f64, f64)),
    Table { min: f64, max: f64 },
}

fn de_range<'de, D>(deserializer: D) -> Result<(f64, f64), D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RangeToml::deserialize(deserializer)? {
        RangeToml::Tuple(r) => r,
        RangeToml::Table { min, max } => (min, max),
    })
}

fn check_range(key: &str, lo: f64, hi: f64) -> eyre::Result<()> {
    if !lo.is_finite() || !hi.is_finite() {
        eyre::bail!("{key} must be finite");
    }
    if lo > hi {
        eyre::bail!("{key} range is inverted ({lo} > {hi})");
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pump
        let p = &self.pump;
        if !(p.basal_minimum_rate.is_finite() && p.basal_minimum_rate >= 0.0) {
            eyre::bail!("pump.basal_minimum_rate must be >= 0");
        }
        if !(p.basal_maximum_rate.is_finite() && p.basal_maximum_rate > 0.0) {
            eyre::bail!("pump.basal_maximum_rate must be > 0");
        }
        if p.basal_minimum_rate >= p.basal_maximum_rate {
            eyre::bail!("pump.basal_minimum_rate must be < pump.basal_maximum_rate");
        }
        if let Some(step) = p.basal_step {
            if !(step.is_finite() && step > 0.0) {
                eyre::bail!("pump.basal_step must be > 0");
            }
        }

        // Hard limits
        let h = &self.hard_limits;
        check_range("hard_limits.dia", h.min_dia, h.max_dia)?;
        check_range("hard_limits.ic", h.min_ic, h.max_ic)?;
        check_range("hard_limits.isf_mgdl", h.min_isf_mgdl, h.max_isf_mgdl)?;
        check_range(
            "hard_limits.target_low_mgdl",
            h.target_low_mgdl.0,
            h.target_low_mgdl.1,
        )?;
        check_range(
            "hard_limits.target_high_mgdl",
            h.target_high_mgdl.0,
            h.target_high_mgdl.1,
        )?;
        if h.min_dia <= 0.0 {
            eyre::bail!("hard_limits.min_dia must be > 0");
        }
        if h.min_ic <= 0.0 {
            eyre::bail!("hard_limits.min_ic must be > 0");
        }
        if h.min_isf_mgdl <= 0.0 {
            eyre::bail!("hard_limits.min_isf_mgdl must be > 0");
        }
        if !(h.max_basal.is_finite() && h.max_basal > 0.0) {
            eyre::bail!("hard_limits.max_basal must be > 0");
        }

        // Validation
        if self.validation.source.trim().is_empty() {
            eyre::bail!("validation.source must not be empty");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref() {
            if !matches!(rot, "never" | "daily" | "hourly") {
                eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
            }
        }

        Ok(())
    }
}
