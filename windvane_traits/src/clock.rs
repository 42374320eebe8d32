use std::thread;
use std::time::{Duration, Instant};

/// Time source for edge timestamps and the cycle pause.
///
/// Edge handlers call `now()` from interrupt threads, so implementations
/// must be cheap and must not block.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Microseconds elapsed since `epoch`; 0 if `epoch` is in the future.
    fn us_since(&self, epoch: Instant) -> u64 {
        let dur = self.now().saturating_duration_since(epoch);
        u64::try_from(dur.as_micros()).unwrap_or(u64::MAX)
    }
}

/// Wall `Instant` clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            thread::sleep(d);
        }
    }
}

#[cfg(any(test, feature = "test-clock"))]
pub mod test_clock {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Manually driven clock. Clones share one timeline, and `sleep` advances
    /// it instead of blocking.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        elapsed_us: Arc<AtomicU64>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                elapsed_us: Arc::new(AtomicU64::new(0)),
            }
        }

        /// Move time forward by `d` (microsecond resolution).
        pub fn advance(&self, d: Duration) {
            let us = u64::try_from(d.as_micros()).unwrap_or(u64::MAX);
            self.elapsed_us.fetch_add(us, Ordering::SeqCst);
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.origin + Duration::from_micros(self.elapsed_us.load(Ordering::SeqCst))
        }

        fn sleep(&self, d: Duration) {
            self.advance(d);
        }
    }

}
