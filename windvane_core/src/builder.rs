//! Builder for `WindEngine`.
//!
//! Every section falls back to its default when not provided; `build()`
//! validates the assembled configuration and reports a typed `BuildError`.

use crate::calibration::CalibrationCurve;
use crate::config::*;
use crate::engine::WindEngine;
use crate::error::{BuildError, Result};
use crate::filter::FilterState;
use crate::util::FULL_TURN_DEG;

#[derive(Debug, Default)]
pub struct EngineBuilder {
    capture: Option<CaptureCfg>,
    timing: Option<TimingCfg>,
    direction: Option<DirectionCfg>,
    bands: Option<Vec<DeviationBand>>,
    calibration: Option<CalibrationCurve>,
    output: Option<OutputCfg>,
    initial_state: Option<FilterState>,
}

impl EngineBuilder {
    /// Seed the builder from a complete config.
    pub fn from_config(cfg: EngineConfig) -> Self {
        Self {
            capture: Some(cfg.capture),
            timing: Some(cfg.timing),
            direction: Some(cfg.direction),
            bands: Some(cfg.bands),
            calibration: Some(cfg.calibration),
            output: Some(cfg.output),
            initial_state: None,
        }
    }

    pub fn with_capture(mut self, capture: CaptureCfg) -> Self {
        self.capture = Some(capture);
        self
    }
    pub fn with_timing(mut self, timing: TimingCfg) -> Self {
        self.timing = Some(timing);
        self
    }
    pub fn with_direction(mut self, direction: DirectionCfg) -> Self {
        self.direction = Some(direction);
        self
    }
    pub fn with_bands(mut self, bands: Vec<DeviationBand>) -> Self {
        self.bands = Some(bands);
        self
    }
    pub fn with_calibration(mut self, calibration: CalibrationCurve) -> Self {
        self.calibration = Some(calibration);
        self
    }
    pub fn with_output(mut self, output: OutputCfg) -> Self {
        self.output = Some(output);
        self
    }
    /// Start the filter from a known state instead of zero.
    pub fn with_filter_state(mut self, state: FilterState) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Validate and build the engine.
    pub fn build(self) -> Result<WindEngine> {
        let cfg = EngineConfig {
            capture: self.capture.unwrap_or_default(),
            timing: self.timing.unwrap_or_default(),
            direction: self.direction.unwrap_or_default(),
            bands: self.bands.unwrap_or_else(default_bands),
            calibration: self.calibration.unwrap_or_default(),
            output: self.output.unwrap_or_default(),
        };
        validate(&cfg).map_err(eyre::Report::new)?;
        let state = self.initial_state.unwrap_or_default();
        if i32::from(state.filtered_direction) >= FULL_TURN_DEG
            || i32::from(state.previous_direction) >= FULL_TURN_DEG
        {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "initial filter directions must be in [0, 360)",
            )));
        }
        Ok(WindEngine::from_config(cfg, state))
    }
}

/// Check an engine config for internal consistency.
pub fn validate(cfg: &EngineConfig) -> std::result::Result<(), BuildError> {
    let gain = cfg.direction.filter_gain;
    if !(0.0..=1.0).contains(&gain) {
        return Err(BuildError::FilterGain);
    }
    if i32::from(cfg.direction.offset_deg) >= FULL_TURN_DEG {
        return Err(BuildError::InvalidConfig("direction offset must be in [0, 360)"));
    }
    if cfg.timing.timeout_us == 0 {
        return Err(BuildError::InvalidConfig("staleness timeout must be > 0"));
    }
    validate_bands(&cfg.bands)?;
    let talker = cfg.output.talker.as_bytes();
    if talker.len() != 2 || !talker.iter().all(u8::is_ascii_uppercase) {
        return Err(BuildError::InvalidConfig(
            "talker id must be two uppercase ASCII letters",
        ));
    }
    Ok(())
}

fn validate_bands(bands: &[DeviationBand]) -> std::result::Result<(), BuildError> {
    let Some((last, head)) = bands.split_last() else {
        return Err(BuildError::Bands("at least one band is required"));
    };
    if last.below_cknots.is_some() {
        return Err(BuildError::Bands("last band must be unbounded"));
    }
    let mut prev = 0i32;
    for band in head {
        let Some(bound) = band.below_cknots else {
            return Err(BuildError::Bands("only the last band may be unbounded"));
        };
        if bound <= prev {
            return Err(BuildError::Bands("band bounds must be positive and ascending"));
        }
        prev = bound;
    }
    for band in bands {
        if band.speed_limit_cknots == 0 {
            return Err(BuildError::Bands("speed limits must be > 0"));
        }
        if band.dir_limit_deg == 0 || band.dir_limit_deg > 180 {
            return Err(BuildError::Bands("direction limits must be in 1..=180"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let e = EngineBuilder::default().build().unwrap();
        assert_eq!(e.config(), &EngineConfig::default());
    }

    #[test]
    fn nan_gain_is_rejected() {
        let err = validate(&EngineConfig {
            direction: DirectionCfg {
                offset_deg: 0,
                filter_gain: f32::NAN,
            },
            ..EngineConfig::default()
        });
        assert_eq!(err, Err(BuildError::FilterGain));
    }
}
