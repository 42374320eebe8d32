//! Pulse simulator standing in for the anemometer when no GPIO backend is
//! compiled in.
//!
//! One background thread produces both pulse trains: a direction edge
//! `period * angle / 360` after each speed edge, then the next speed edge at
//! the end of the revolution. An optional bounce edge follows each speed
//! edge. The thread is shut down and joined when the simulator is dropped.

use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use windvane_traits::{Clock, EdgeHandler, Level, PulseLine};

/// Poll interval while the simulated rotor is stopped.
const CALM_POLL: Duration = Duration::from_millis(20);

type Slot = Arc<Mutex<Option<EdgeHandler>>>;

/// Pulse input fed by the simulator thread.
#[derive(Clone, Default)]
pub struct SimLine {
    slot: Slot,
}

impl SimLine {
    fn fire(&self, level: Level) {
        let mut guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handler) = guard.as_mut() {
            handler(level);
        }
    }
}

impl PulseLine for SimLine {
    fn subscribe(
        &mut self,
        handler: EdgeHandler,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(handler);
        Ok(())
    }
}

/// Runtime-adjustable rotor parameters.
#[derive(Debug)]
struct Rotor {
    /// 0 stops the rotor.
    speed_period_us: AtomicU64,
    angle_deg: AtomicU16,
    bounce_us: AtomicU64,
}

pub struct SimulatedAnemometer {
    speed: SimLine,
    dir: SimLine,
    rotor: Arc<Rotor>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl core::fmt::Debug for SimulatedAnemometer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimulatedAnemometer")
            .field("rotor", &self.rotor)
            .field("running", &self.join_handle.is_some())
            .finish()
    }
}

impl SimulatedAnemometer {
    /// Create the simulator; no edges are produced until `start`.
    pub fn new(speed_period: Duration, angle_deg: u16, bounce: Duration) -> Self {
        Self {
            speed: SimLine::default(),
            dir: SimLine::default(),
            rotor: Arc::new(Rotor {
                speed_period_us: AtomicU64::new(duration_us(speed_period)),
                angle_deg: AtomicU16::new(angle_deg % 360),
                bounce_us: AtomicU64::new(duration_us(bounce)),
            }),
            shutdown: Arc::new(AtomicBool::new(false)),
            join_handle: None,
        }
    }

    /// The speed-pulse input. Clones share the subscription.
    pub fn speed_line(&self) -> SimLine {
        self.speed.clone()
    }

    /// The direction-pulse input. Clones share the subscription.
    pub fn dir_line(&self) -> SimLine {
        self.dir.clone()
    }

    pub fn set_speed_period(&self, period: Duration) {
        self.rotor
            .speed_period_us
            .store(duration_us(period), Ordering::Relaxed);
    }

    /// Spawn the pulse thread. Calling it again while running is a no-op.
    pub fn start<C: Clock + Send + Sync + 'static>(&mut self, clock: C) {
        if self.join_handle.is_some() {
            return;
        }
        let speed = self.speed.clone();
        let dir = self.dir.clone();
        let rotor = Arc::clone(&self.rotor);
        let shutdown = Arc::clone(&self.shutdown);

        self.join_handle = Some(std::thread::spawn(move || {
            tracing::debug!("simulator thread started");
            // time already spent in the current revolution by a bounce edge
            let mut carry = 0u64;
            while !shutdown.load(Ordering::Relaxed) {
                let period = rotor.speed_period_us.load(Ordering::Relaxed);
                if period == 0 {
                    carry = 0;
                    clock.sleep(CALM_POLL);
                    continue;
                }
                let angle = u64::from(rotor.angle_deg.load(Ordering::Relaxed));
                let lead = period.saturating_mul(angle) / 360;
                clock.sleep(Duration::from_micros(lead.saturating_sub(carry)));
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                dir.fire(Level::Low);
                clock.sleep(Duration::from_micros(period.saturating_sub(lead.max(carry))));
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                speed.fire(Level::Low);

                carry = 0;
                let bounce = rotor.bounce_us.load(Ordering::Relaxed);
                if bounce > 0 && bounce < period {
                    clock.sleep(Duration::from_micros(bounce));
                    speed.fire(Level::Low);
                    carry = bounce;
                }
            }
            tracing::trace!("simulator thread exiting cleanly");
        }));
    }

    /// Stop and join the pulse thread.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            if handle.join().is_err() {
                tracing::warn!("simulator thread panicked");
            }
        }
    }
}

impl Drop for SimulatedAnemometer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn duration_us(d: Duration) -> u64 {
    d.as_micros().min(u128::from(u64::MAX)) as u64
}
