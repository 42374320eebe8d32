//! `From` implementations bridging `windvane_config` types to `windvane_core` types.

use crate::calibration::{CalibrationCurve, CalibrationSegment};
use crate::config::{
    CaptureCfg, DeviationBand, DirectionCfg, EngineConfig, OutputCfg, OutputMode, TimingCfg,
};
use crate::error::BuildError;
use crate::fixed_point::knots_to_cknots;
use crate::util::ms_to_us;

// ── Capture / timing / direction ─────────────────────────────────────────────

impl From<&windvane_config::CaptureCfg> for CaptureCfg {
    fn from(c: &windvane_config::CaptureCfg) -> Self {
        Self {
            debounce_us: c.debounce_us,
        }
    }
}

impl From<&windvane_config::TimingCfg> for TimingCfg {
    fn from(c: &windvane_config::TimingCfg) -> Self {
        Self {
            timeout_us: ms_to_us(c.timeout_ms),
            update_rate_ms: c.update_rate_ms,
            cycle_pause_ms: c.cycle_pause_ms,
        }
    }
}

impl From<&windvane_config::DirectionCfg> for DirectionCfg {
    fn from(c: &windvane_config::DirectionCfg) -> Self {
        Self {
            offset_deg: c.offset_deg,
            filter_gain: c.filter_gain,
        }
    }
}

// ── Bands ────────────────────────────────────────────────────────────────────

impl From<&windvane_config::BandCfg> for DeviationBand {
    fn from(c: &windvane_config::BandCfg) -> Self {
        Self {
            below_cknots: c.below_knots.map(knots_to_cknots),
            speed_limit_cknots: knots_to_cknots(c.speed_dev_knots).max(0) as u32,
            dir_limit_deg: c.dir_dev_deg,
        }
    }
}

// ── Calibration ──────────────────────────────────────────────────────────────

impl From<&windvane_config::SegmentRow> for CalibrationSegment {
    fn from(r: &windvane_config::SegmentRow) -> Self {
        Self {
            below_rps: r.below_rps,
            a_num: r.a_num,
            a_den: r.a_den,
            b_num: r.b_num,
            b_den: r.b_den,
            c: r.c,
        }
    }
}

/// An empty table selects the manufacturer curve.
pub fn curve_from_rows(rows: &[windvane_config::SegmentRow]) -> Result<CalibrationCurve, BuildError> {
    if rows.is_empty() {
        return Ok(CalibrationCurve::default());
    }
    CalibrationCurve::new(rows.iter().map(CalibrationSegment::from).collect())
}

// ── Output ───────────────────────────────────────────────────────────────────

impl From<windvane_config::OutputMode> for OutputMode {
    fn from(m: windvane_config::OutputMode) -> Self {
        match m {
            windvane_config::OutputMode::Nmea => Self::Nmea,
            windvane_config::OutputMode::Diagnostic => Self::Diagnostic,
        }
    }
}

impl From<&windvane_config::OutputCfg> for OutputCfg {
    fn from(c: &windvane_config::OutputCfg) -> Self {
        Self {
            mode: c.mode.into(),
            talker: c.talker.clone(),
        }
    }
}

// ── Whole config ─────────────────────────────────────────────────────────────

impl TryFrom<&windvane_config::Config> for EngineConfig {
    type Error = BuildError;

    fn try_from(c: &windvane_config::Config) -> Result<Self, Self::Error> {
        Ok(Self {
            capture: (&c.capture).into(),
            timing: (&c.timing).into(),
            direction: (&c.direction).into(),
            bands: c.bands.iter().map(DeviationBand::from).collect(),
            calibration: curve_from_rows(&c.calibration.segments)?,
            output: (&c.output).into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_file_config_matches_engine_defaults() {
        let cfg = windvane_config::load_toml("[pins]\nspeed_in = 17\ndir_in = 27\n").unwrap();
        let engine = EngineConfig::try_from(&cfg).unwrap();
        assert_eq!(engine, EngineConfig::default());
    }

    #[test]
    fn band_knots_convert_to_cknots() {
        let b = DeviationBand::from(&windvane_config::BandCfg {
            below_knots: Some(12.5),
            speed_dev_knots: 4.0,
            dir_dev_deg: 20,
        });
        assert_eq!(b.below_cknots, Some(1_250));
        assert_eq!(b.speed_limit_cknots, 400);
    }
}
