//! Period-to-speed calibration.
//!
//! The speed pulse period is first converted to `rps` (revolutions per 100 s)
//! and then mapped to centiknots by a piecewise quadratic. Each term is a
//! rational with truncating integer division, evaluated term by term, so the
//! result is bit-for-bit reproducible without floating point.

use crate::error::BuildError;

/// `rps = RPS_TIME_BASE_US / period_us`, i.e. revolutions per 100 seconds.
pub const RPS_TIME_BASE_US: u64 = 100_000_000;

/// Revolutions per 100 s for a speed period. A zero period yields 0.
#[inline]
pub fn rps_from_period(period_us: u64) -> i64 {
    if period_us == 0 {
        return 0;
    }
    (RPS_TIME_BASE_US / period_us) as i64
}

/// `a_num·rps²/a_den + b_num·rps/b_den + c`, valid for `rps < below_rps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationSegment {
    /// Exclusive upper bound; `None` for the last segment.
    pub below_rps: Option<i64>,
    pub a_num: i64,
    pub a_den: i64,
    pub b_num: i64,
    pub b_den: i64,
    pub c: i64,
}

impl CalibrationSegment {
    /// Evaluate the polynomial in cknots, not floored.
    #[inline]
    pub fn eval(&self, rps: i64) -> i64 {
        let sq = rps.saturating_mul(rps);
        let a = sq.saturating_mul(self.a_num) / self.a_den;
        let b = rps.saturating_mul(self.b_num) / self.b_den;
        a.saturating_add(b).saturating_add(self.c)
    }

    #[inline]
    fn covers(&self, rps: i64) -> bool {
        self.below_rps.is_none_or(|b| rps < b)
    }
}

/// Ordered list of segments closing with an unbounded one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationCurve {
    segments: Vec<CalibrationSegment>,
}

impl Default for CalibrationCurve {
    /// The manufacturer curve for the cup anemometer.
    fn default() -> Self {
        Self {
            segments: vec![
                CalibrationSegment {
                    below_rps: Some(323),
                    a_num: -11,
                    a_den: 11_507,
                    b_num: 293,
                    b_den: 115,
                    c: -12,
                },
                CalibrationSegment {
                    below_rps: Some(5_436),
                    a_num: 1,
                    a_den: 23_014,
                    b_num: 220,
                    b_den: 115,
                    c: 96,
                },
                CalibrationSegment {
                    below_rps: None,
                    a_num: 11,
                    a_den: 11_507,
                    b_num: -957,
                    b_den: 115,
                    c: 28_664,
                },
            ],
        }
    }
}

impl CalibrationCurve {
    /// Build a curve from segments. Bounds must be strictly ascending, every
    /// denominator non-zero, and only the last segment unbounded.
    pub fn new(segments: Vec<CalibrationSegment>) -> Result<Self, BuildError> {
        let Some((last, head)) = segments.split_last() else {
            return Err(BuildError::Calibration("at least one segment is required"));
        };
        if last.below_rps.is_some() {
            return Err(BuildError::Calibration("last segment must be unbounded"));
        }
        let mut prev: Option<i64> = None;
        for seg in head {
            let Some(bound) = seg.below_rps else {
                return Err(BuildError::Calibration("only the last segment may be unbounded"));
            };
            if prev.is_some_and(|p| bound <= p) {
                return Err(BuildError::Calibration("segment bounds must be ascending"));
            }
            prev = Some(bound);
        }
        if segments.iter().any(|s| s.a_den == 0 || s.b_den == 0) {
            return Err(BuildError::Calibration("denominators must be non-zero"));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[CalibrationSegment] {
        &self.segments
    }

    /// Speed in cknots for a given `rps`, floored at 0.
    pub fn speed_from_rps(&self, rps: i64) -> i32 {
        let seg = self
            .segments
            .iter()
            .find(|s| s.covers(rps))
            .or_else(|| self.segments.last());
        let Some(seg) = seg else {
            return 0;
        };
        seg.eval(rps).clamp(0, i64::from(i32::MAX)) as i32
    }

    /// Speed in cknots for a speed pulse period in us. Pure; a zero period is 0.
    pub fn calibrate(&self, period_us: u64) -> i32 {
        if period_us == 0 {
            return 0;
        }
        self.speed_from_rps(rps_from_period(period_us))
    }
}
