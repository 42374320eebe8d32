#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse, validation and build errors are fine; panics are not.
    let Ok(cfg) = windvane_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        let _ = windvane_core::engine_from_file_config(&cfg);
    }
});
