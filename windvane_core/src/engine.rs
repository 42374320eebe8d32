//! The per-cycle measurement computation: staleness check, calibration and
//! deviation filtering over one timing snapshot.

use crate::builder::EngineBuilder;
use crate::calibration::rps_from_period;
use crate::capture::TimingState;
use crate::config::EngineConfig;
use crate::filter::{DeviationFilter, FilterState};
use crate::status::{CycleOutcome, CycleReport, OutputReading};
use crate::util::MICROS_PER_MILLI;

/// Hardware-agnostic wind engine. Owns the filter state; takes timing
/// snapshots as input.
#[derive(Debug, Clone)]
pub struct WindEngine {
    config: EngineConfig,
    filter: DeviationFilter,
}

impl WindEngine {
    /// Start building an engine from defaults.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Construct without validation. Use the builder for untrusted config.
    pub(crate) fn from_config(config: EngineConfig, state: FilterState) -> Self {
        let filter = DeviationFilter::with_state(
            config.bands.clone(),
            config.direction.offset_deg,
            config.direction.filter_gain,
            state,
        );
        Self { config, filter }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The currently published reading.
    pub fn reading(&self) -> OutputReading {
        self.filter.reading()
    }

    pub fn filter_state(&self) -> &FilterState {
        self.filter.state()
    }

    /// True when the snapshot carries no usable speed pulse at `now_us`.
    pub fn is_stale(&self, st: &TimingState, now_us: u64) -> bool {
        st.speed_period_us == 0
            || now_us.saturating_sub(st.speed_pulse_us) > self.config.timing.timeout_us
    }

    /// Run calibration and the deviation filter over one snapshot.
    pub fn process(&mut self, st: &TimingState, now_us: u64) -> CycleReport {
        let timestamp_ms = now_us / MICROS_PER_MILLI;
        if self.is_stale(st, now_us) {
            let outcome = self.filter.go_idle();
            tracing::debug!(timestamp_ms, "no speed pulse within timeout; idle");
            return CycleReport {
                timestamp_ms,
                rps: 0,
                raw_speed_cknots: 0,
                outcome,
                reading: self.filter.reading(),
            };
        }

        let rps = rps_from_period(st.speed_period_us);
        let speed = self.config.calibration.speed_from_rps(rps);
        let outcome = self
            .filter
            .apply(speed, st.speed_period_us, st.direction_period_us);
        let reading = self.filter.reading();
        match outcome {
            CycleOutcome::SpeedRejected => tracing::debug!(
                timestamp_ms,
                rps,
                speed_cknots = speed,
                previous_cknots = reading.speed_cknots,
                "speed sample rejected"
            ),
            _ => tracing::debug!(
                timestamp_ms,
                rps,
                speed_cknots = speed,
                direction = ?outcome.direction(),
                filtered_deg = reading.direction_deg,
                "speed sample accepted"
            ),
        }
        CycleReport {
            timestamp_ms,
            rps,
            raw_speed_cknots: speed,
            outcome,
            reading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::DirectionOutcome;

    fn snapshot(speed_pulse_us: u64, speed_period_us: u64, direction_period_us: u64) -> TimingState {
        TimingState {
            speed_pulse_us,
            dir_pulse_us: 0,
            speed_period_us,
            direction_period_us,
        }
    }

    #[test]
    fn zero_period_is_idle() {
        let mut e = WindEngine::builder().build().unwrap();
        let r = e.process(&TimingState::default(), 0);
        assert_eq!(r.outcome, CycleOutcome::Idle);
        assert_eq!(r.reading.speed_cknots, 0);
    }

    #[test]
    fn timeout_boundary_is_exclusive() {
        let mut e = WindEngine::builder().build().unwrap();
        let st = snapshot(1_000_000, 333_333, 0);
        let r = e.process(&st, 2_500_000); // exactly 1.5 s after the pulse
        assert_ne!(r.outcome, CycleOutcome::Idle);
        let r = e.process(&st, 2_500_001);
        assert_eq!(r.outcome, CycleOutcome::Idle);
        assert_eq!(e.filter_state().previous_speed, 0);
    }

    #[test]
    fn accepted_cycle_reports_rps_and_direction() {
        let mut e = WindEngine::builder().build().unwrap();
        let r = e.process(&snapshot(1_400_000, 1_000_000, 0), 1_400_000);
        assert_eq!(r.rps, 100);
        assert_eq!(r.raw_speed_cknots, 233);
        assert_eq!(r.timestamp_ms, 1_400);
        assert_eq!(
            r.outcome,
            CycleOutcome::SpeedAccepted(DirectionOutcome::Accepted { raw_deg: 0 })
        );
    }
}
