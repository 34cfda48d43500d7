//! Safety validation of a profile against pump capabilities and hard limits.
//!
//! Checks run in a fixed order and report at most one reason per category.
//! Basal categories are reported in the order they were first detected:
//!
//! 1. basal alignment to whole hours (unless the pump supports sub-hour basal)
//! 2. basal device range, clamping every offending segment in place; the
//!    first clamp detected (minimum or maximum) is the category's reason
//! 3. basal hard range `[0.01, max_basal]` for segments that were not clamped
//! 4. DIA, carb ratio, sensitivity and target hard ranges (never mutated)
//!
//! A failed check is data, not an error: the profile stays readable and only
//! its activation is blocked.

use crate::block::HOUR_MS;
use crate::config::{HardLimits, MIN_BASAL_HARD_LIMIT, PumpDescription, ValidationCfg};
use crate::profile::Profile;
use crate::schedule::Schedule;
use crate::units::{round_to, to_mgdl};
use profile_traits::{Notification, NotificationCode, NotificationSink, Severity};
use thiserror::Error;

/// Quantity named in a hard-limit reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitedValue {
    Basal,
    Dia,
    CarbRatio,
    Sensitivity,
    LowTarget,
    HighTarget,
}

impl std::fmt::Display for LimitedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Basal => "Basal",
            Self::Dia => "DIA",
            Self::CarbRatio => "Carbs ratio",
            Self::Sensitivity => "Sensitivity",
            Self::LowTarget => "Low target",
            Self::HighTarget => "High target",
        })
    }
}

/// One failed category.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidityIssue {
    #[error("Basal values not aligned to hours: {from}")]
    NotAlignedToHours { from: String },
    #[error("Basal value replaced by minimum supported value: {from}")]
    MinimumBasalReplaced { from: String },
    #[error("Basal value replaced by maximum supported value: {from}")]
    MaximumBasalReplaced { from: String },
    #[error("{what} value out of hard limits: {value:.2}")]
    OutOfHardLimits { what: LimitedValue, value: f64 },
}

impl ValidityIssue {
    /// Issues that were corrected in place by clamping.
    pub fn is_correcting(&self) -> bool {
        matches!(
            self,
            Self::MinimumBasalReplaced { .. } | Self::MaximumBasalReplaced { .. }
        )
    }

    fn notification_code(&self) -> Option<NotificationCode> {
        match self {
            Self::NotAlignedToHours { .. } => Some(NotificationCode::BasalProfileNotAlignedToHours),
            Self::MinimumBasalReplaced { .. } => Some(NotificationCode::MinimalBasalValueReplaced),
            Self::MaximumBasalReplaced { .. } => Some(NotificationCode::MaximumBasalValueReplaced),
            Self::OutOfHardLimits { .. } => None,
        }
    }
}

/// Outcome of a validation pass; reasons are in detection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidityCheck {
    pub issues: Vec<ValidityIssue>,
}

impl ValidityCheck {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Plain-language reasons, one per failed category.
    pub fn reasons(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

/// Corrected copy of a profile plus the report that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub profile: Profile,
    pub check: ValidityCheck,
}

#[derive(Debug, Clone)]
pub struct ProfileValidator<N> {
    pump: PumpDescription,
    limits: HardLimits,
    cfg: ValidationCfg,
    sink: N,
}

impl<N: NotificationSink> ProfileValidator<N> {
    pub fn new(pump: PumpDescription, limits: HardLimits, sink: N) -> Self {
        Self {
            pump,
            limits,
            cfg: ValidationCfg::default(),
            sink,
        }
    }

    pub fn with_config(mut self, cfg: ValidationCfg) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn pump(&self) -> &PumpDescription {
        &self.pump
    }

    pub fn limits(&self) -> &HardLimits {
        &self.limits
    }

    /// Validate a private copy; the caller's profile is left untouched.
    pub fn validate(&self, profile: &Profile) -> Validated {
        let mut corrected = profile.clone();
        let check = self.validate_in_place(&mut corrected);
        Validated {
            profile: corrected,
            check,
        }
    }

    /// Validate and clamp basal segments of `profile` in place.
    ///
    /// The exclusive borrow is the single-writer guarantee: nobody can be
    /// evaluating this instance while it is being clamped.
    pub fn validate_in_place(&self, profile: &mut Profile) -> ValidityCheck {
        let mut check = ValidityCheck::default();
        self.check_basal(profile, &mut check);
        self.check_hard_limits(profile, &mut check);

        for issue in &check.issues {
            tracing::debug!(reason = %issue, correcting = issue.is_correcting(), "profile validation issue");
        }
        if !check.is_valid() {
            tracing::info!(
                source = %self.cfg.source,
                issues = check.issues.len(),
                "profile failed validation"
            );
        }
        check
    }

    fn check_basal(&self, profile: &mut Profile, check: &mut ValidityCheck) {
        let from = &self.cfg.source;
        let multiplier = profile.percentage().basal_multiplier();
        let pump = &self.pump;

        let mut misaligned = false;
        let mut device_range = false;
        let mut out_of_limits = false;
        let mut detected = Vec::new();

        for block in profile.basal_blocks_mut() {
            let scaled = block.amount * multiplier;
            if !pump.supports_sub_hour_basal && !misaligned && block.duration % HOUR_MS != 0 {
                misaligned = true;
                detected.push(ValidityIssue::NotAlignedToHours { from: from.clone() });
            }
            let clamped = if scaled < pump.basal_minimum_rate {
                Some((
                    pump.basal_minimum_rate,
                    ValidityIssue::MinimumBasalReplaced { from: from.clone() },
                ))
            } else if scaled > pump.basal_maximum_rate {
                Some((
                    pump.basal_maximum_rate,
                    ValidityIssue::MaximumBasalReplaced { from: from.clone() },
                ))
            } else {
                None
            };
            match clamped {
                Some((limit, issue)) => {
                    block.amount = pump.clamp_amount(limit, multiplier);
                    if !device_range {
                        device_range = true;
                        detected.push(issue);
                    }
                }
                None if !out_of_limits
                    && !HardLimits::is_in_range(scaled, MIN_BASAL_HARD_LIMIT, self.limits.max_basal) =>
                {
                    out_of_limits = true;
                    detected.push(ValidityIssue::OutOfHardLimits {
                        what: LimitedValue::Basal,
                        value: scaled,
                    });
                }
                None => {}
            }
        }

        for issue in detected {
            self.notify(&issue);
            check.issues.push(issue);
        }
    }

    fn check_hard_limits(&self, profile: &Profile, check: &mut ValidityCheck) {
        let limits = &self.limits;
        let units = profile.units();
        let ratio = profile.percentage().ratio_multiplier();

        let dia = profile.dia();
        if !HardLimits::is_in_range(dia, limits.min_dia, limits.max_dia) {
            check.issues.push(ValidityIssue::OutOfHardLimits {
                what: LimitedValue::Dia,
                value: dia,
            });
        }

        if let Some(value) = profile
            .ic_blocks()
            .iter()
            .map(|b| b.amount * ratio)
            .find(|v| !HardLimits::is_in_range(*v, limits.min_ic, limits.max_ic))
        {
            check.issues.push(ValidityIssue::OutOfHardLimits {
                what: LimitedValue::CarbRatio,
                value,
            });
        }

        if let Some(value) = profile
            .isf_blocks()
            .iter()
            .map(|b| b.amount * ratio)
            .find(|v| !HardLimits::is_in_range(to_mgdl(*v, units), limits.min_isf, limits.max_isf))
        {
            check.issues.push(ValidityIssue::OutOfHardLimits {
                what: LimitedValue::Sensitivity,
                value,
            });
        }

        for target in profile.target_blocks() {
            let low = round_to(to_mgdl(target.low, units), 0.1);
            if !HardLimits::is_in_range(low, limits.target_low.0, limits.target_low.1) {
                check.issues.push(ValidityIssue::OutOfHardLimits {
                    what: LimitedValue::LowTarget,
                    value: target.low,
                });
                break;
            }
            let high = round_to(to_mgdl(target.high, units), 0.1);
            if !HardLimits::is_in_range(high, limits.target_high.0, limits.target_high.1) {
                check.issues.push(ValidityIssue::OutOfHardLimits {
                    what: LimitedValue::HighTarget,
                    value: target.high,
                });
                break;
            }
        }
    }

    fn notify(&self, issue: &ValidityIssue) {
        let Some(code) = issue.notification_code() else {
            return;
        };
        if code == NotificationCode::BasalProfileNotAlignedToHours && !self.cfg.aps_mode {
            return;
        }
        self.sink.send(Notification {
            code,
            message: issue.to_string(),
            severity: Severity::Normal,
        });
    }
}

/// Validate a private copy of `profile` with default validation settings.
pub fn validate(
    profile: &Profile,
    pump: &PumpDescription,
    limits: &HardLimits,
    sink: &impl NotificationSink,
) -> Validated {
    ProfileValidator::new(pump.clone(), limits.clone(), sink).validate(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, TargetBlock};
    use crate::mocks::RecordingSink;
    use crate::profile::{InsulinConfiguration, ProfileSwitch, ScheduleSet};
    use crate::units::GlucoseUnit;

    fn profile(basal: Vec<Block>) -> Profile {
        ProfileSwitch::new(
            0,
            "Test",
            ScheduleSet {
                basal_blocks: basal,
                isf_blocks: vec![Block::hours(24, 50.0)],
                ic_blocks: vec![Block::hours(24, 10.0)],
                target_blocks: vec![TargetBlock::hours(24, 100.0, 120.0)],
            },
            GlucoseUnit::Mgdl,
            InsulinConfiguration::new("Rapid", 6 * HOUR_MS, 75 * 60_000),
        )
        .into()
    }

    #[test]
    fn clean_profile_passes_without_side_effects() {
        let sink = RecordingSink::new();
        let p = profile(vec![Block::hours(24, 1.0)]);
        let out = validate(&p, &PumpDescription::default(), &HardLimits::default(), &sink);
        assert!(out.check.is_valid());
        assert_eq!(out.profile, p);
        assert!(sink.sent().is_empty());
    }

    #[test]
    fn misalignment_still_clamps_the_same_segment() {
        let sink = RecordingSink::new();
        let p = profile(vec![Block::new(HOUR_MS / 2, 0.01), Block::new(HOUR_MS * 47 / 2, 1.0)]);
        let out = validate(&p, &PumpDescription::default(), &HardLimits::default(), &sink);
        assert_eq!(
            out.check.issues,
            vec![
                ValidityIssue::NotAlignedToHours { from: "ProfileSwitch".into() },
                ValidityIssue::MinimumBasalReplaced { from: "ProfileSwitch".into() },
            ]
        );
        assert_eq!(out.profile.basal_blocks()[0].amount, 0.05);
        assert_eq!(
            sink.codes(),
            vec![
                NotificationCode::BasalProfileNotAlignedToHours,
                NotificationCode::MinimalBasalValueReplaced
            ]
        );
    }

    #[test]
    fn alignment_is_silent_outside_aps_mode() {
        let sink = RecordingSink::new();
        let v = ProfileValidator::new(PumpDescription::default(), HardLimits::default(), &sink)
            .with_config(ValidationCfg {
                aps_mode: false,
                source: "Import".into(),
            });
        let check = v.validate(&profile(vec![Block::new(HOUR_MS / 2, 1.0), Block::new(HOUR_MS * 47 / 2, 1.0)])).check;
        assert_eq!(check.reasons(), vec!["Basal values not aligned to hours: Import".to_string()]);
        assert!(sink.sent().is_empty());
    }

    #[test]
    fn clamp_targets_the_scaled_value() {
        let sink = RecordingSink::new();
        let ps = match profile(vec![Block::hours(24, 20.0)]) {
            Profile::Switch(ps) => ps.with_percentage(200).unwrap(),
            _ => unreachable!(),
        };
        let out = validate(&ps.into(), &PumpDescription::default(), &HardLimits::default(), &sink);
        // 20 U/h at 200 % is 40 U/h; clamped so that it evaluates to the pump max.
        assert_eq!(out.profile.basal_time_from_midnight(0), 25.0);
        assert_eq!(
            out.check.issues,
            vec![ValidityIssue::MaximumBasalReplaced { from: "ProfileSwitch".into() }]
        );
    }

    #[test]
    fn basal_above_hard_limit_but_within_pump() {
        let sink = RecordingSink::new();
        let out = validate(
            &profile(vec![Block::hours(24, 12.0)]),
            &PumpDescription::default(),
            &HardLimits::default(),
            &sink,
        );
        assert_eq!(out.check.reasons(), vec!["Basal value out of hard limits: 12.00".to_string()]);
        assert_eq!(out.profile.basal_blocks()[0].amount, 12.0);
    }
}
