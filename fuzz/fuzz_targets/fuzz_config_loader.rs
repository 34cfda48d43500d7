#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are fine; panics are not.
    let Ok(cfg) = toml::from_str::<profile_config::Config>(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        // A config that validates must map into core types.
        let pump: profile_core::PumpDescription = (&cfg.pump).into();
        let _limits: profile_core::HardLimits = (&cfg.hard_limits).into();
        let _ = pump.clamp_amount(pump.basal_maximum_rate, 1.0);
    }
});
