//! Pulse capture: the producer side shared with edge handlers.
//!
//! Edge handlers run on GPIO interrupt threads (or the simulator thread) and
//! only subtract timestamps under a short lock. The consumer takes a single
//! consistent snapshot of the timing state and waits on a bounded(1)
//! new-data slot.

use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use windvane_traits::{Clock, EdgeHandler, Level, MonotonicClock, PulseLine};

use crate::error::Result;
use crate::hw_error::map_hw_error;

/// Edge trace bit for the speed line.
pub const TRACE_SPEED: u8 = 1;
/// Edge trace bit for the direction line.
pub const TRACE_DIRECTION: u8 = 2;

/// Shared timing state, all in us since the capture epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimingState {
    pub speed_pulse_us: u64,
    pub dir_pulse_us: u64,
    pub speed_period_us: u64,
    /// Only updated when the direction edge came at or after the previous speed edge.
    pub direction_period_us: u64,
}

/// Per-line accepted/rejected edge counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeCounters {
    pub speed_accepted: u32,
    pub speed_rejected: u32,
    pub dir_accepted: u32,
    pub dir_rejected: u32,
}

pub struct PulseCapture {
    state: Mutex<TimingState>,
    notify_tx: Sender<()>,
    notify_rx: Receiver<()>,
    trace: AtomicU8,
    speed_accepted: AtomicU32,
    speed_rejected: AtomicU32,
    dir_accepted: AtomicU32,
    dir_rejected: AtomicU32,
    debounce_us: u64,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
}

impl core::fmt::Debug for PulseCapture {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PulseCapture")
            .field("state", &self.snapshot())
            .field("debounce_us", &self.debounce_us)
            .field("counters", &self.counters())
            .finish()
    }
}

impl PulseCapture {
    /// Capture with the real monotonic clock; the epoch is now.
    pub fn new(debounce_us: u64) -> Self {
        Self::with_clock(debounce_us, Arc::new(MonotonicClock::new()))
    }

    /// Capture on an injected clock; the epoch is the clock's current instant.
    pub fn with_clock(debounce_us: u64, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let (notify_tx, notify_rx) = bounded(1);
        let epoch = clock.now();
        Self {
            state: Mutex::new(TimingState::default()),
            notify_tx,
            notify_rx,
            trace: AtomicU8::new(0),
            speed_accepted: AtomicU32::new(0),
            speed_rejected: AtomicU32::new(0),
            dir_accepted: AtomicU32::new(0),
            dir_rejected: AtomicU32::new(0),
            debounce_us,
            clock,
            epoch,
        }
    }

    /// Microseconds since the capture epoch.
    #[inline]
    pub fn now_us(&self) -> u64 {
        self.clock.us_since(self.epoch)
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    /// Handle a speed-line edge at the current time.
    pub fn on_speed_edge(&self, level: Level) -> bool {
        self.record_speed_edge(self.now_us(), level)
    }

    /// Handle a direction-line edge at the current time.
    pub fn on_dir_edge(&self, level: Level) -> bool {
        self.record_dir_edge(self.now_us(), level)
    }

    /// Speed edge at `now_us`. Returns whether it was accepted.
    pub fn record_speed_edge(&self, now_us: u64, level: Level) -> bool {
        self.trace.fetch_or(TRACE_SPEED, Ordering::Relaxed);
        let accepted = {
            let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if now_us.saturating_sub(st.speed_pulse_us) > self.debounce_us && level == Level::Low
            {
                st.speed_period_us = now_us - st.speed_pulse_us;
                if st.dir_pulse_us >= st.speed_pulse_us {
                    st.direction_period_us = st.dir_pulse_us - st.speed_pulse_us;
                }
                st.speed_pulse_us = now_us;
                true
            } else {
                false
            }
        };
        if accepted {
            self.speed_accepted.fetch_add(1, Ordering::Relaxed);
            // A full slot already signals new data.
            if let Err(TrySendError::Disconnected(())) = self.notify_tx.try_send(()) {
                tracing::trace!("new-data slot disconnected");
            }
        } else {
            self.speed_rejected.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(now_us, ?level, "speed edge rejected");
        }
        accepted
    }

    /// Direction edge at `now_us`. Returns whether it was accepted.
    pub fn record_dir_edge(&self, now_us: u64, level: Level) -> bool {
        self.trace.fetch_or(TRACE_DIRECTION, Ordering::Relaxed);
        let accepted = {
            let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if now_us.saturating_sub(st.dir_pulse_us) > self.debounce_us && level == Level::Low {
                st.dir_pulse_us = now_us;
                true
            } else {
                false
            }
        };
        if accepted {
            self.dir_accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.dir_rejected.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(now_us, ?level, "direction edge rejected");
        }
        accepted
    }

    /// One consistent copy of the timing state.
    pub fn snapshot(&self) -> TimingState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until a speed edge was accepted or `timeout` elapses.
    /// Consumes the notification; returns false on timeout.
    pub fn wait_for_data(&self, timeout: Duration) -> bool {
        self.notify_rx.recv_timeout(timeout).is_ok()
    }

    /// Return and clear the edge trace mask.
    pub fn take_trace(&self) -> u8 {
        self.trace.swap(0, Ordering::Relaxed)
    }

    pub fn counters(&self) -> EdgeCounters {
        EdgeCounters {
            speed_accepted: self.speed_accepted.load(Ordering::Relaxed),
            speed_rejected: self.speed_rejected.load(Ordering::Relaxed),
            dir_accepted: self.dir_accepted.load(Ordering::Relaxed),
            dir_rejected: self.dir_rejected.load(Ordering::Relaxed),
        }
    }

    /// Edge handler feeding the speed line.
    pub fn speed_handler(self: &Arc<Self>) -> EdgeHandler {
        let me = Arc::clone(self);
        Box::new(move |level| {
            me.on_speed_edge(level);
        })
    }

    /// Edge handler feeding the direction line.
    pub fn dir_handler(self: &Arc<Self>) -> EdgeHandler {
        let me = Arc::clone(self);
        Box::new(move |level| {
            me.on_dir_edge(level);
        })
    }

    /// Subscribe both handlers to their lines.
    pub fn arm<S, D>(self: &Arc<Self>, speed: &mut S, dir: &mut D) -> Result<()>
    where
        S: PulseLine + ?Sized,
        D: PulseLine + ?Sized,
    {
        speed
            .subscribe(self.speed_handler())
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))?;
        dir.subscribe(self.dir_handler())
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))?;
        tracing::info!(debounce_us = self.debounce_us, "pulse inputs armed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debounce_is_strict() {
        let cap = PulseCapture::new(10_000);
        assert!(cap.record_speed_edge(20_000, Level::Low));
        assert!(!cap.record_speed_edge(30_000, Level::Low)); // exactly debounce
        assert!(cap.record_speed_edge(30_001, Level::Low));
        assert_eq!(cap.snapshot().speed_period_us, 10_001);
    }

    #[test]
    fn high_level_is_rejected() {
        let cap = PulseCapture::new(10_000);
        assert!(!cap.record_speed_edge(50_000, Level::High));
        assert!(!cap.record_dir_edge(50_000, Level::High));
        assert_eq!(cap.snapshot(), TimingState::default());
        let c = cap.counters();
        assert_eq!((c.speed_rejected, c.dir_rejected), (1, 1));
    }

    #[test]
    fn direction_period_requires_dir_after_speed() {
        let cap = PulseCapture::new(10_000);
        cap.record_speed_edge(100_000, Level::Low);
        cap.record_dir_edge(190_000, Level::Low);
        cap.record_speed_edge(460_000, Level::Low);
        let st = cap.snapshot();
        assert_eq!(st.speed_period_us, 360_000);
        assert_eq!(st.direction_period_us, 90_000);
        // no direction edge since the last speed edge
        cap.record_speed_edge(820_000, Level::Low);
        assert_eq!(cap.snapshot().direction_period_us, 90_000);
    }

    #[test]
    fn notification_is_single_slot() {
        let cap = PulseCapture::new(0);
        cap.record_speed_edge(1, Level::Low);
        cap.record_speed_edge(2, Level::Low);
        assert!(cap.wait_for_data(Duration::from_millis(1)));
        assert!(!cap.wait_for_data(Duration::from_millis(1)));
    }

    #[test]
    fn trace_records_every_edge() {
        let cap = PulseCapture::new(10_000);
        cap.record_dir_edge(5, Level::Low); // rejected by debounce
        assert_eq!(cap.take_trace(), TRACE_DIRECTION);
        assert_eq!(cap.take_trace(), 0);
        cap.record_speed_edge(20_000, Level::Low);
        cap.record_dir_edge(40_000, Level::Low);
        assert_eq!(cap.take_trace(), TRACE_SPEED | TRACE_DIRECTION);
    }
}
