//! Edges in, sentences out: capture, engine and controller wired together on
//! a test clock.

use std::sync::Arc;
use std::time::Duration;

use windvane_core::encoder::sentence_checksum;
use windvane_core::error::WindError;
use windvane_core::mocks::{ManualLine, RecordingSink, UnavailableLine};
use windvane_core::{CycleController, OutputCfg, OutputMode, PulseCapture, TimingCfg, WindEngine};
use windvane_traits::Level;
use windvane_traits::clock::test_clock::TestClock;

struct Rig {
    clock: TestClock,
    speed: ManualLine,
    dir: ManualLine,
    capture: Arc<PulseCapture>,
    sink: RecordingSink,
    ctl: CycleController<RecordingSink>,
}

fn rig(mode: OutputMode) -> Rig {
    let clock = TestClock::new();
    let capture = Arc::new(PulseCapture::with_clock(10_000, Arc::new(clock.clone())));
    let mut speed = ManualLine::default();
    let mut dir = ManualLine::default();
    capture.arm(&mut speed, &mut dir).unwrap();
    let engine = WindEngine::builder()
        .with_timing(TimingCfg {
            timeout_us: 400_000,
            update_rate_ms: 500,
            cycle_pause_ms: 0,
        })
        .with_output(OutputCfg {
            mode,
            talker: "WI".into(),
        })
        .build()
        .unwrap();
    let sink = RecordingSink::default();
    let ctl = CycleController::new(engine, Arc::clone(&capture), sink.clone());
    Rig {
        clock,
        speed,
        dir,
        capture,
        sink,
        ctl,
    }
}

impl Rig {
    // direction edge a quarter turn in, speed edge at the end of a 360 ms revolution
    fn revolution(&self) {
        self.clock.advance(Duration::from_millis(90));
        assert!(self.dir.fire(Level::Low));
        self.clock.advance(Duration::from_millis(270));
        assert!(self.speed.fire(Level::Low));
    }
}

#[test]
fn steady_rotation_produces_filtered_sentence() {
    let mut r = rig(OutputMode::Nmea);

    r.revolution();
    let first = r.ctl.step(); // 6.2 kn from rest exceeds the 5 kn limit
    assert_eq!(first.outcome.label(), "rejected");

    r.revolution();
    let second = r.ctl.step();
    assert_eq!(second.reading.speed_cknots, 620);
    assert_eq!(second.outcome.direction().raw_deg(), Some(90)); // 90 deg jump, rejected

    r.revolution();
    let third = r.ctl.step();
    assert_eq!(third.reading.direction_deg, 23);

    let lines = r.sink.lines();
    assert_eq!(lines.len(), 2, "{lines:?}");
    assert!(lines[0].starts_with("$WIMWV,0.0,R,0.0,N,A*"));
    assert!(lines[1].starts_with("$WIMWV,23.0,R,6.2,N,A*"));
    let cs = sentence_checksum(&lines[1]).unwrap();
    assert!(lines[1].ends_with(&format!("*{cs:02X}\r\n")));
}

#[test]
fn losing_the_speed_pulse_reports_calm() {
    let mut r = rig(OutputMode::Nmea);
    for _ in 0..3 {
        r.revolution();
        r.ctl.step();
    }
    r.clock.advance(Duration::from_millis(600));
    let idle = r.ctl.step();
    assert_eq!(idle.outcome.label(), "idle");
    let lines = r.sink.lines();
    assert!(lines.last().unwrap().starts_with("$WIMWV,23.0,R,0.0,N,A*"));
}

#[test]
fn bounce_inside_debounce_window_is_ignored() {
    let r = rig(OutputMode::Nmea);
    r.revolution();
    r.clock.advance(Duration::from_millis(5));
    r.speed.fire(Level::Low);
    r.speed.fire(Level::High);
    let edges = r.capture.counters();
    assert_eq!(edges.speed_accepted, 1);
    assert_eq!(edges.speed_rejected, 2);
    assert_eq!(r.capture.snapshot().speed_period_us, 360_000);
}

#[test]
fn diagnostic_mode_prints_csv_and_edge_trace() {
    let mut r = rig(OutputMode::Diagnostic);
    r.revolution();
    r.ctl.step();
    let lines = r.sink.lines();
    assert_eq!(lines, vec!["360,0,0,0\n", "[INT] WIND\n", "[INT] DIR\n"]);
}

#[test]
fn arming_an_unavailable_line_is_a_hardware_error() {
    let capture = Arc::new(PulseCapture::new(10_000));
    let mut speed = UnavailableLine;
    let mut dir = ManualLine::default();
    let err = capture.arm(&mut speed, &mut dir).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<WindError>(),
        Some(WindError::Hardware(_))
    ));
}
