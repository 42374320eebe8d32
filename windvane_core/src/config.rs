//! Configuration types for the wind engine.
//!
//! These are the runtime configuration structs consumed by `WindEngine`.
//! They are separate from the TOML-deserialized config in `windvane_config`.

use crate::calibration::CalibrationCurve;
use crate::util::ms_to_us;

/// Edge capture configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureCfg {
    /// An edge is accepted only if strictly more than this many us passed
    /// since the last accepted edge on the same line.
    pub debounce_us: u64,
}

impl Default for CaptureCfg {
    fn default() -> Self {
        Self { debounce_us: 10_000 }
    }
}

/// Cycle timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingCfg {
    /// Staleness window: no speed pulse for longer than this means zero wind.
    /// Also bounds how long the controller waits for new data.
    pub timeout_us: u64,
    /// Minimum spacing between emitted sentences in normal mode.
    pub update_rate_ms: u64,
    /// Pause after each cycle before waiting again.
    pub cycle_pause_ms: u64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            timeout_us: ms_to_us(1_500),
            update_rate_ms: 500,
            cycle_pause_ms: 10,
        }
    }
}

/// Vane configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionCfg {
    /// Mounting offset added to the raw angle, in [0, 360).
    pub offset_deg: u16,
    /// Low-pass gain in [0.0, 1.0]; 1.0 tracks the raw angle, 0.0 freezes it.
    pub filter_gain: f32,
}

impl Default for DirectionCfg {
    fn default() -> Self {
        Self {
            offset_deg: 0,
            filter_gain: 0.25,
        }
    }
}

/// One speed range with its deviation limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviationBand {
    /// Exclusive upper bound in cknots; `None` for the last, unbounded band.
    pub below_cknots: Option<i32>,
    /// A speed sample is accepted iff `|dev| < speed_limit_cknots`.
    pub speed_limit_cknots: u32,
    /// Direction deviation limit in degrees.
    pub dir_limit_deg: u16,
}

impl DeviationBand {
    #[inline]
    pub fn contains(&self, speed_cknots: i32) -> bool {
        self.below_cknots.is_none_or(|b| speed_cknots < b)
    }
}

/// Manufacturer band table: below 10 kn, below 80 kn, above.
pub fn default_bands() -> Vec<DeviationBand> {
    vec![
        DeviationBand {
            below_cknots: Some(1_000),
            speed_limit_cknots: 500,
            dir_limit_deg: 25,
        },
        DeviationBand {
            below_cknots: Some(8_000),
            speed_limit_cknots: 1_000,
            dir_limit_deg: 18,
        },
        DeviationBand {
            below_cknots: None,
            speed_limit_cknots: 3_000,
            dir_limit_deg: 10,
        },
    ]
}

/// Pick the band for `speed_cknots`. Falls back to the last band when the
/// table is not closed (the builder rejects such tables).
pub fn select_band(bands: &[DeviationBand], speed_cknots: i32) -> Option<&DeviationBand> {
    bands
        .iter()
        .find(|b| b.contains(speed_cknots))
        .or_else(|| bands.last())
}

/// Output stage selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Rate-limited MWV sentences.
    #[default]
    Nmea,
    /// One CSV line per cycle plus edge trace lines.
    Diagnostic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputCfg {
    pub mode: OutputMode,
    /// Two-letter NMEA talker id.
    pub talker: String,
}

impl Default for OutputCfg {
    fn default() -> Self {
        Self {
            mode: OutputMode::Nmea,
            talker: "WI".to_string(),
        }
    }
}

/// Immutable engine configuration, passed in at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub capture: CaptureCfg,
    pub timing: TimingCfg,
    pub direction: DirectionCfg,
    pub bands: Vec<DeviationBand>,
    pub calibration: CalibrationCurve,
    pub output: OutputCfg,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capture: CaptureCfg::default(),
            timing: TimingCfg::default(),
            direction: DirectionCfg::default(),
            bands: default_bands(),
            calibration: CalibrationCurve::default(),
            output: OutputCfg::default(),
        }
    }
}
