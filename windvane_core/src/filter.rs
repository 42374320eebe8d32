//! Deviation filter: band-limited outlier rejection for speed and direction
//! plus a circular low-pass on direction.

use crate::config::{DeviationBand, select_band};
use crate::fixed_point::abs_diff_i32_u32;
use crate::status::{CycleOutcome, DirectionOutcome, OutputReading};
use crate::util::FULL_TURN_DEG;

/// Filter memory. Zero at construction and never reset afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterState {
    /// Raw speed of the previous non-idle cycle, accepted or not.
    pub previous_speed: i32,
    /// Raw direction of the previous evaluated cycle, accepted or not.
    pub previous_direction: u16,
    pub filtered_direction: u16,
    /// Set when the last non-idle speed sample was an outlier.
    pub ignore_next_reading: bool,
}

/// `|speed - previous| < limit`.
#[inline]
pub fn speed_within_band(speed: i32, previous: i32, band: &DeviationBand) -> bool {
    abs_diff_i32_u32(speed, previous) < band.speed_limit_cknots
}

/// Circular acceptance: within `limit` on either side of 0/360.
#[inline]
pub fn direction_within_band(raw: u16, previous: u16, band: &DeviationBand) -> bool {
    let dev = abs_diff_i32_u32(i32::from(raw), i32::from(previous));
    let limit = u32::from(band.dir_limit_deg);
    dev < limit || dev > (FULL_TURN_DEG as u32).saturating_sub(limit)
}

/// Vane angle from the phase of the direction edge within a revolution.
/// Caller guarantees `direction_period_us <= speed_period_us` and a non-zero speed period.
#[inline]
pub fn raw_direction(direction_period_us: u64, speed_period_us: u64, offset_deg: u16) -> u16 {
    let phase = direction_period_us.saturating_mul(FULL_TURN_DEG as u64) / speed_period_us.max(1);
    ((phase + u64::from(offset_deg)) % FULL_TURN_DEG as u64) as u16
}

/// `to - from` folded into [-180, 180].
#[inline]
pub fn shortest_delta(from: u16, to: u16) -> i32 {
    let mut d = i32::from(to) - i32::from(from);
    if d > 180 {
        d -= FULL_TURN_DEG;
    } else if d < -180 {
        d += FULL_TURN_DEG;
    }
    d
}

/// `round(gain * delta)`, ties away from zero.
#[inline]
pub fn scale_by_gain(delta: i32, gain: f32) -> i32 {
    (gain * delta as f32).round() as i32
}

/// Move `filtered` toward `raw` by `gain` of the short-arc delta.
#[inline]
pub fn smooth_direction(filtered: u16, raw: u16, gain: f32) -> u16 {
    let step = scale_by_gain(shortest_delta(filtered, raw), gain);
    (i32::from(filtered) + step).rem_euclid(FULL_TURN_DEG) as u16
}

/// Stateful filter owned by the consumer.
#[derive(Debug, Clone)]
pub struct DeviationFilter {
    bands: Vec<DeviationBand>,
    offset_deg: u16,
    gain: f32,
    state: FilterState,
    reading: OutputReading,
}

impl DeviationFilter {
    pub fn new(bands: Vec<DeviationBand>, offset_deg: u16, gain: f32) -> Self {
        Self::with_state(bands, offset_deg, gain, FilterState::default())
    }

    /// Start from a known state, with the published direction matching it.
    pub fn with_state(
        bands: Vec<DeviationBand>,
        offset_deg: u16,
        gain: f32,
        state: FilterState,
    ) -> Self {
        Self {
            bands,
            offset_deg,
            gain,
            reading: OutputReading {
                speed_cknots: 0,
                direction_deg: state.filtered_direction,
            },
            state,
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn reading(&self) -> OutputReading {
        self.reading
    }

    /// Stale data: publish zero speed and forget the previous speed.
    /// Direction and `ignore_next_reading` are left alone.
    pub fn go_idle(&mut self) -> CycleOutcome {
        self.reading.speed_cknots = 0;
        self.state.previous_speed = 0;
        CycleOutcome::Idle
    }

    /// Run one non-idle sample through the filter.
    pub fn apply(
        &mut self,
        speed_cknots: i32,
        speed_period_us: u64,
        direction_period_us: u64,
    ) -> CycleOutcome {
        let Some(band) = select_band(&self.bands, speed_cknots).copied() else {
            return CycleOutcome::SpeedRejected;
        };
        let accepted = speed_within_band(speed_cknots, self.state.previous_speed, &band);
        self.state.previous_speed = speed_cknots;
        self.state.ignore_next_reading = !accepted;
        if !accepted {
            return CycleOutcome::SpeedRejected;
        }
        self.reading.speed_cknots = speed_cknots;

        if direction_period_us > speed_period_us || speed_period_us == 0 {
            return CycleOutcome::SpeedAccepted(DirectionOutcome::Stale);
        }
        let raw = raw_direction(direction_period_us, speed_period_us, self.offset_deg);
        let ok = direction_within_band(raw, self.state.previous_direction, &band);
        self.state.previous_direction = raw;
        if !ok {
            return CycleOutcome::SpeedAccepted(DirectionOutcome::Rejected { raw_deg: raw });
        }
        self.state.filtered_direction =
            smooth_direction(self.state.filtered_direction, raw, self.gain);
        self.reading.direction_deg = self.state.filtered_direction;
        CycleOutcome::SpeedAccepted(DirectionOutcome::Accepted { raw_deg: raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_bands;

    #[test]
    fn short_arc_across_north() {
        assert_eq!(shortest_delta(358, 2), 4);
        assert_eq!(shortest_delta(2, 358), -4);
        assert_eq!(shortest_delta(0, 180), 180);
        assert_eq!(shortest_delta(90, 45), -45);
    }

    #[test]
    fn smoothing_wraps_into_range() {
        assert_eq!(smooth_direction(358, 2, 1.0), 2);
        assert_eq!(smooth_direction(2, 358, 1.0), 358);
        assert_eq!(smooth_direction(0, 90, 0.25), 23);
        assert_eq!(smooth_direction(0, 270, 0.25), 337); // -90 * 0.25 = -22.5 -> -23
    }

    #[test]
    fn gain_step_rounds_half_away_from_zero() {
        assert_eq!(scale_by_gain(90, 0.25), 23);
        assert_eq!(scale_by_gain(-90, 0.25), -23);
        assert_eq!(scale_by_gain(2, 0.25), 1);
        assert_eq!(scale_by_gain(-2, 0.25), -1);
        assert_eq!(scale_by_gain(1, 0.25), 0);
        assert_eq!(scale_by_gain(180, 1.0), 180);
    }

    #[test]
    fn small_gain_is_not_quantized_up() {
        // 0.0026 * 180 = 0.468, which rounds to no movement.
        assert_eq!(scale_by_gain(180, 0.0026), 0);
        assert_eq!(scale_by_gain(-180, 0.0026), 0);
        assert_eq!(smooth_direction(0, 180, 0.0026), 0);
        // 0.0026 * 200 = 0.52
        assert_eq!(scale_by_gain(200, 0.0026), 1);
    }

    #[test]
    fn smoothing_is_idempotent_at_zero_deviation() {
        for d in [0u16, 1, 179, 180, 359] {
            assert_eq!(smooth_direction(d, d, 0.25), d);
        }
    }

    #[test]
    fn direction_band_accepts_across_wrap() {
        let bands = default_bands();
        let mid = bands[1];
        assert!(direction_within_band(3, 359, &mid));
        assert!(direction_within_band(10, 359, &mid)); // dev 349 > 342
        assert!(!direction_within_band(17, 359, &mid)); // dev 342
        assert!(!direction_within_band(20, 2, &mid)); // dev 18
        assert!(direction_within_band(19, 2, &mid));
    }

    #[test]
    fn raw_direction_applies_offset() {
        assert_eq!(raw_direction(90_000, 360_000, 0), 90);
        assert_eq!(raw_direction(90_000, 360_000, 300), 30);
        assert_eq!(raw_direction(360_000, 360_000, 0), 0);
    }

    #[test]
    fn rejected_speed_keeps_reading_and_flags_next() {
        let mut f = DeviationFilter::new(default_bands(), 0, 0.25);
        f.apply(400, 360_000, 0);
        assert_eq!(f.reading().speed_cknots, 400);
        let out = f.apply(4_400, 360_000, 0);
        assert_eq!(out, CycleOutcome::SpeedRejected);
        assert_eq!(f.reading().speed_cknots, 400);
        assert!(f.state().ignore_next_reading);
        assert_eq!(f.state().previous_speed, 4_400);
    }

    #[test]
    fn stale_direction_leaves_previous_direction() {
        let mut f = DeviationFilter::new(default_bands(), 0, 0.25);
        let out = f.apply(100, 360_000, 400_000);
        assert_eq!(out, CycleOutcome::SpeedAccepted(DirectionOutcome::Stale));
        assert_eq!(f.state().previous_direction, 0);
        assert_eq!(f.reading().direction_deg, 0);
    }

    #[test]
    fn go_idle_zeroes_speed_only() {
        let mut f = DeviationFilter::new(default_bands(), 0, 1.0);
        f.apply(300, 360_000, 10_000);
        assert_eq!(f.reading().direction_deg, 10);
        assert_eq!(f.go_idle(), CycleOutcome::Idle);
        assert_eq!(f.reading().speed_cknots, 0);
        assert_eq!(f.reading().direction_deg, 10);
        assert_eq!(f.state().previous_speed, 0);
    }
}
