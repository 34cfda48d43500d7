#![no_main]
use libfuzzer_sys::fuzz_target;
use profile_core::{
    HardLimits, NullSink, Profile, PumpDescription, PureProfile, Schedule, to_canonical_form,
    validate,
};

fuzz_target!(|data: &str| {
    // Importing arbitrary documents must never panic; whatever imports must
    // evaluate, export and validate without panicking either.
    let Ok(pure) = PureProfile::from_ns_json(data) else {
        return;
    };
    let profile = Profile::Pure(pure);
    for hour in 0..24 {
        let s = hour * 3600;
        let _ = profile.basal_time_from_midnight(s);
        let _ = profile.isf_mgdl_time_from_midnight(s);
        let _ = profile.target_mgdl_time_from_midnight(s);
    }
    let _ = to_canonical_form(&profile);
    let out = validate(&profile, &PumpDescription::default(), &HardLimits::default(), &NullSink);
    assert_eq!(out.check.is_valid(), out.check.reasons().is_empty());
});
