#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core wind measurement logic (hardware-agnostic).
//!
//! This crate turns two asynchronous pulse trains from a cup/vane anemometer
//! into a stable speed/direction reading. All hardware interactions go
//! through `windvane_traits::PulseLine` and `windvane_traits::SentenceSink`.
//!
//! ## Architecture
//!
//! - **Capture**: debounced edge handlers writing a shared `TimingState` (`capture` module)
//! - **Calibration**: period → rps → piecewise quadratic speed (`calibration` module)
//! - **Filtering**: band-limited outlier rejection, circular smoothing (`filter` module)
//! - **Engine**: staleness check and per-cycle computation (`WindEngine`)
//! - **Output**: MWV sentences and diagnostic lines (`encoder` module)
//! - **Controller**: wait/snapshot/compute/emit loop (`runner` module)
//!
//! ## Fixed-Point Arithmetic
//!
//! Speeds are **centiknots** (cknots, 0.01 kn) in `i32`, timestamps are `u64`
//! microseconds since the capture epoch. Nothing in the capture or
//! calibration path uses floating point; only the direction low-pass step
//! multiplies by the `f32` filter gain.

pub mod builder;
pub mod calibration;
pub mod capture;
pub mod config;
pub mod conversions;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod filter;
pub mod fixed_point;
pub mod hw_error;
pub mod mocks;
pub mod runner;
pub mod status;
pub mod util;

pub use builder::EngineBuilder;
pub use calibration::{CalibrationCurve, CalibrationSegment};
pub use capture::{EdgeCounters, PulseCapture, TimingState};
pub use config::{
    CaptureCfg, DeviationBand, DirectionCfg, EngineConfig, OutputCfg, OutputMode, TimingCfg,
};
pub use encoder::{OutputEncoder, mwv_sentence};
pub use engine::WindEngine;
pub use error::{BuildError, WindError};
pub use filter::{DeviationFilter, FilterState};
pub use runner::{CycleController, RunSummary};
pub use status::{CycleOutcome, CycleReport, DirectionOutcome, OutputReading};

/// Build an engine straight from a validated file config.
pub fn engine_from_file_config(cfg: &windvane_config::Config) -> error::Result<WindEngine> {
    let engine_cfg = EngineConfig::try_from(cfg).map_err(eyre::Report::new)?;
    EngineBuilder::from_config(engine_cfg).build()
}
