#![no_main]
use libfuzzer_sys::arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use windvane_core::{EngineBuilder, TimingState, mwv_sentence};

#[derive(Debug, Arbitrary)]
struct Cycle {
    speed_pulse_us: u64,
    dir_pulse_us: u64,
    speed_period_us: u64,
    direction_period_us: u64,
    now_us: u64,
}

fuzz_target!(|cycles: Vec<Cycle>| {
    let Ok(mut engine) = EngineBuilder::default().build() else {
        return;
    };
    for c in cycles {
        let st = TimingState {
            speed_pulse_us: c.speed_pulse_us,
            dir_pulse_us: c.dir_pulse_us,
            speed_period_us: c.speed_period_us,
            direction_period_us: c.direction_period_us,
        };
        let report = engine.process(&st, c.now_us);
        assert!(report.reading.direction_deg < 360);
        assert!(report.reading.speed_cknots >= 0);
        let s = mwv_sentence("WI", &report.reading);
        assert!(s.starts_with("$WIMWV,") && s.ends_with("\r\n"));
    }
});
