//! The `run` command: wire pulse inputs, engine and transport, then loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::Result;
use windvane_config::{Config, TransportKind};
use windvane_core::{
    CycleController, EngineBuilder, EngineConfig, OutputMode, PulseCapture, RunSummary, WindError,
};
use windvane_hardware::{DynLine, SimulatedAnemometer, UdpSink, stdout_sink};
use windvane_traits::{MonotonicClock, SentenceSink};

pub struct RunArgs {
    pub diagnostic: bool,
    pub max_cycles: Option<u64>,
    pub sim: bool,
}

/// Both pulse lines plus the simulator that drives them, if any.
struct PulseSource {
    speed: DynLine,
    dir: DynLine,
    sim: Option<SimulatedAnemometer>,
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_gpio(cfg: &Config) -> Result<PulseSource> {
    let (speed, dir) = windvane_hardware::open_gpio_lines(cfg.pins.speed_in, cfg.pins.dir_in)
        .map_err(|e| eyre::Report::new(WindError::Hardware(e.to_string())))?;
    tracing::info!(
        speed_in = cfg.pins.speed_in,
        dir_in = cfg.pins.dir_in,
        "using GPIO pulse inputs"
    );
    Ok(PulseSource {
        speed,
        dir,
        sim: None,
    })
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn open_gpio(_cfg: &Config) -> Result<PulseSource> {
    Err(eyre::Report::new(WindError::Hardware(
        "built without GPIO support".into(),
    )))
}

fn open_sim(cfg: &Config) -> PulseSource {
    let sim = SimulatedAnemometer::new(
        Duration::from_millis(cfg.sim.speed_period_ms),
        cfg.sim.angle_deg,
        Duration::from_micros(cfg.sim.bounce_us),
    );
    tracing::info!(
        speed_period_ms = cfg.sim.speed_period_ms,
        angle_deg = cfg.sim.angle_deg,
        bounce_us = cfg.sim.bounce_us,
        "using simulated pulse inputs"
    );
    PulseSource {
        speed: Box::new(sim.speed_line()),
        dir: Box::new(sim.dir_line()),
        sim: Some(sim),
    }
}

fn open_sink(cfg: &Config, mode: OutputMode) -> Result<Box<dyn SentenceSink + Send>> {
    // Diagnostic lines are for a human on a terminal.
    if mode == OutputMode::Diagnostic {
        return Ok(Box::new(stdout_sink()));
    }
    match (cfg.output.transport, cfg.output.udp_target.as_deref()) {
        (TransportKind::Udp, Some(target)) => {
            let sink = UdpSink::connect(target)
                .map_err(|e| eyre::Report::new(WindError::Transport(e.to_string())))?;
            Ok(Box::new(sink))
        }
        (TransportKind::Udp, None) => Err(eyre::Report::new(WindError::Config(
            "output.udp_target is required for the udp transport".into(),
        ))),
        (TransportKind::Stdout, _) => Ok(Box::new(stdout_sink())),
    }
}

pub fn run(cfg: &Config, args: &RunArgs) -> Result<RunSummary> {
    let mut engine_cfg = EngineConfig::try_from(cfg).map_err(eyre::Report::new)?;
    if args.diagnostic {
        engine_cfg.output.mode = OutputMode::Diagnostic;
    }
    let mode = engine_cfg.output.mode;
    let debounce_us = engine_cfg.capture.debounce_us;
    let engine = EngineBuilder::from_config(engine_cfg).build()?;

    let capture = Arc::new(PulseCapture::new(debounce_us));
    let mut source = if args.sim || !windvane_hardware::has_gpio_backend() {
        open_sim(cfg)
    } else {
        open_gpio(cfg)?
    };
    capture.arm(&mut source.speed, &mut source.dir)?;
    let sink = open_sink(cfg, mode)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
            tracing::warn!(error = %e, "Ctrl-C handler not installed");
        }
    }

    if let Some(sim) = source.sim.as_mut() {
        sim.start(MonotonicClock::new());
    }
    tracing::info!(mode = ?mode, max_cycles = ?args.max_cycles, "measurement started");

    let mut controller = CycleController::new(engine, capture, sink);
    let summary = controller.run(&shutdown, args.max_cycles);

    if let Some(mut sim) = source.sim.take() {
        sim.stop();
    }
    Ok(summary)
}

/// Build the engine and arm the inputs without starting a measurement.
pub fn self_check(cfg: &Config) -> Result<&'static str> {
    let engine = windvane_core::engine_from_file_config(cfg)?;
    let (mut source, backend) = if windvane_hardware::has_gpio_backend() {
        (open_gpio(cfg)?, "gpio")
    } else {
        (open_sim(cfg), "sim")
    };
    let capture = Arc::new(PulseCapture::new(engine.config().capture.debounce_us));
    capture.arm(&mut source.speed, &mut source.dir)?;
    tracing::info!(backend, bands = engine.config().bands.len(), "self-check passed");
    Ok(backend)
}
