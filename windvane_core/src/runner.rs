use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use windvane_traits::SentenceSink;

use crate::capture::PulseCapture;
use crate::config::OutputMode;
use crate::encoder::{OutputEncoder, trace_lines};
use crate::engine::WindEngine;
use crate::status::CycleReport;

/// Totals for one `run` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub cycles: u64,
    pub sentences_sent: u64,
    pub send_failures: u64,
}

/// The measurement cycle consumer: wait, snapshot, compute, emit, pause.
pub struct CycleController<K: SentenceSink> {
    engine: WindEngine,
    capture: Arc<PulseCapture>,
    encoder: OutputEncoder,
    sink: K,
    wait: Duration,
    pause: Duration,
    summary: RunSummary,
}

impl<K: SentenceSink> core::fmt::Debug for CycleController<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CycleController")
            .field("reading", &self.engine.reading())
            .field("mode", &self.encoder.mode())
            .field("summary", &self.summary)
            .finish()
    }
}

impl<K: SentenceSink> CycleController<K> {
    pub fn new(engine: WindEngine, capture: Arc<PulseCapture>, sink: K) -> Self {
        let timing = engine.config().timing;
        let encoder = OutputEncoder::new(&engine.config().output, timing.update_rate_ms);
        Self {
            wait: Duration::from_micros(timing.timeout_us),
            pause: Duration::from_millis(timing.cycle_pause_ms),
            engine,
            capture,
            encoder,
            sink,
            summary: RunSummary::default(),
        }
    }

    pub fn engine(&self) -> &WindEngine {
        &self.engine
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// One full cycle. Blocks at most the staleness timeout plus the pause.
    pub fn step(&mut self) -> CycleReport {
        let woke = self.capture.wait_for_data(self.wait);
        let st = self.capture.snapshot();
        let report = self.engine.process(&st, self.capture.now_us());
        if !woke {
            tracing::trace!(timestamp_ms = report.timestamp_ms, "wait timed out");
        }

        if let Some(text) = self.encoder.encode(&report) {
            self.emit(&text);
        }
        if self.encoder.mode() == OutputMode::Diagnostic {
            for line in trace_lines(self.capture.take_trace()) {
                self.emit(line);
            }
        }
        self.summary.cycles += 1;
        if !self.pause.is_zero() {
            self.capture.clock().sleep(self.pause);
        }
        report
    }

    /// Loop until `shutdown` is raised or `max_cycles` cycles completed.
    pub fn run(&mut self, shutdown: &AtomicBool, max_cycles: Option<u64>) -> RunSummary {
        let start = self.summary.cycles;
        while !shutdown.load(Ordering::Relaxed) {
            if max_cycles.is_some_and(|n| self.summary.cycles - start >= n) {
                break;
            }
            self.step();
        }
        let edges = self.capture.counters();
        tracing::debug!(
            speed_accepted = edges.speed_accepted,
            speed_rejected = edges.speed_rejected,
            dir_accepted = edges.dir_accepted,
            dir_rejected = edges.dir_rejected,
            "edge counters"
        );
        tracing::info!(
            cycles = self.summary.cycles,
            sent = self.summary.sentences_sent,
            send_failures = self.summary.send_failures,
            "controller stopped"
        );
        self.summary
    }

    fn emit(&mut self, text: &str) {
        match self.sink.send(text) {
            Ok(()) => self.summary.sentences_sent += 1,
            Err(e) => {
                self.summary.send_failures += 1;
                tracing::warn!(error = %e, "transport send failed; dropping output");
            }
        }
    }
}
