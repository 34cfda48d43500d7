#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Profile engine: daily insulin schedules, evaluation and safety checks.
//!
//! All collaborators (wall clock, notification delivery) are reached through
//! `profile_traits`; this crate does no I/O.
//!
//! ## Architecture
//!
//! - **Blocks**: duration-keyed segments covering a day (`block` module)
//! - **Evaluation**: time-of-day lookup with percentage and timeshift (`evaluator`, `schedule`)
//! - **Normalization**: midnight-aligned, value-preserving rotation (`normalizer`)
//! - **Profiles**: switch, effective switch and raw profile behind one surface (`profile`)
//! - **Safety**: pump range clamping and hard limits (`validator`)
//! - **Overrides**: temporary basals and extended boluses (`temporary_basal`)
//! - **Export**: Nightscout JSON in and out (`export`)
//!
//! ## Units
//!
//! Durations are milliseconds, basal is U/h. Sensitivity and targets are
//! stored in the profile's own units and converted to mg/dL on request.

pub mod block;
pub mod config;
pub mod conversions;
pub mod error;
pub mod evaluator;
pub mod export;
pub mod mocks;
pub mod normalizer;
pub mod notify;
pub mod percentage;
pub mod profile;
pub mod schedule;
pub mod temporary_basal;
pub mod timezone;
pub mod units;
pub mod validator;

pub use block::{Block, DAY_MS, HOUR_MS, TargetBlock};
pub use config::{HardLimits, PumpDescription, ValidationCfg};
pub use error::{ProfileError, Report, Result};
pub use export::{NsEntry, NsProfileJson, to_canonical_form, to_pure_ns_json};
pub use normalizer::normalize;
pub use notify::{NullSink, TracingSink};
pub use percentage::Percentage;
pub use profile::{
    EffectiveProfileSwitch, InsulinConfiguration, Profile, ProfileSwitch, PureProfile, ScheduleSet,
};
pub use schedule::{ProfileValue, Schedule};
pub use temporary_basal::{
    ExtendedBolus, TemporaryBasal, TemporaryBasalType, active_temporary_basal, effective_basal_rate,
};
pub use units::GlucoseUnit;
pub use validator::{ProfileValidator, Validated, ValidityCheck, ValidityIssue, validate};
