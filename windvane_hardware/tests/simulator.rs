//! Simulator thread lifecycle and pulse ordering.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use windvane_hardware::SimulatedAnemometer;
use windvane_traits::{Level, MonotonicClock, PulseLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Speed,
    Dir,
}

type Log = Arc<Mutex<Vec<(Edge, Instant)>>>;

fn record(sim: &SimulatedAnemometer) -> Log {
    let log: Log = Arc::default();
    let l = Arc::clone(&log);
    sim.speed_line()
        .subscribe(Box::new(move |lvl| {
            assert_eq!(lvl, Level::Low);
            l.lock().unwrap().push((Edge::Speed, Instant::now()));
        }))
        .unwrap();
    let l = Arc::clone(&log);
    sim.dir_line()
        .subscribe(Box::new(move |_| {
            l.lock().unwrap().push((Edge::Dir, Instant::now()));
        }))
        .unwrap();
    log
}

#[test]
fn edges_alternate_direction_then_speed() {
    let mut sim = SimulatedAnemometer::new(Duration::from_millis(20), 90, Duration::ZERO);
    let log = record(&sim);
    sim.start(MonotonicClock::new());
    std::thread::sleep(Duration::from_millis(150));
    sim.stop();

    let edges: Vec<Edge> = log.lock().unwrap().iter().map(|(e, _)| *e).collect();
    assert!(edges.len() >= 4, "{edges:?}");
    for pair in edges.chunks_exact(2) {
        assert_eq!(pair, [Edge::Dir, Edge::Speed]);
    }
}

#[test]
fn bounce_adds_a_second_speed_edge() {
    let mut sim = SimulatedAnemometer::new(
        Duration::from_millis(30),
        180,
        Duration::from_millis(2),
    );
    let log = record(&sim);
    sim.start(MonotonicClock::new());
    std::thread::sleep(Duration::from_millis(120));
    sim.stop();

    let edges: Vec<Edge> = log.lock().unwrap().iter().map(|(e, _)| *e).collect();
    assert!(
        edges.windows(2).any(|w| w == [Edge::Speed, Edge::Speed]),
        "{edges:?}"
    );
}

#[test]
fn stopped_rotor_produces_no_edges() {
    let mut sim = SimulatedAnemometer::new(Duration::ZERO, 0, Duration::ZERO);
    let log = record(&sim);
    sim.start(MonotonicClock::new());
    std::thread::sleep(Duration::from_millis(60));
    assert!(log.lock().unwrap().is_empty());

    sim.set_speed_period(Duration::from_millis(10));
    std::thread::sleep(Duration::from_millis(80));
    drop(sim);
    assert!(!log.lock().unwrap().is_empty());
}

#[test]
fn repeated_start_stop_does_not_leak_threads() {
    for _ in 0..10 {
        let mut sim = SimulatedAnemometer::new(Duration::from_millis(5), 45, Duration::ZERO);
        sim.start(MonotonicClock::new());
        sim.start(MonotonicClock::new());
        std::thread::sleep(Duration::from_millis(5));
        drop(sim);
    }
}
