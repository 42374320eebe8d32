use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use windvane_core::calibration::{CalibrationCurve, RPS_TIME_BASE_US};
use windvane_core::{TimingState, WindEngine};

// Synthetic gusty trace of speed periods: slow sine on rps with xorshift noise
fn synth_periods(n: usize, seed: u32) -> Vec<u64> {
    let mut state = seed.max(1);
    let mut next = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        x
    };
    (0..n)
        .map(|i| {
            let base = 1_500.0 + 1_000.0 * (i as f32 / 150.0).sin();
            let noise = (next() % 200) as f32 - 100.0;
            let rps = (base + noise).max(50.0) as u64;
            RPS_TIME_BASE_US / rps
        })
        .collect()
}

pub fn bench_calibrate(c: &mut Criterion) {
    let curve = CalibrationCurve::default();
    let periods = synth_periods(4_096, 0xC0FFEE);
    c.bench_function("calibrate_4k", |b| {
        b.iter(|| {
            let mut acc = 0i64;
            for &p in &periods {
                acc += i64::from(curve.calibrate(black_box(p)));
            }
            black_box(acc)
        })
    });
}

pub fn bench_process(c: &mut Criterion) {
    let periods = synth_periods(4_096, 0xBEEF);
    c.bench_function("engine_process_4k", |b| {
        b.iter_batched(
            || WindEngine::builder().build().unwrap_or_else(|e| panic!("{e}")),
            |mut engine| {
                let mut now = 0u64;
                for &p in &periods {
                    now += p;
                    let st = TimingState {
                        speed_pulse_us: now,
                        dir_pulse_us: now - p / 3,
                        speed_period_us: p,
                        direction_period_us: p / 3,
                    };
                    black_box(engine.process(&st, now));
                }
                engine.reading()
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_calibrate, bench_process);
criterion_main!(benches);
