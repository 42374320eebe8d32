//! `windvane`: read a cup/vane anemometer and stream NMEA MWV sentences.

mod cli;
mod error_fmt;
mod rt;
mod run;

use std::io::Write;
use std::path::Path;

use clap::Parser;
use eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE, RtLock};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use windvane_config::Config;
use windvane_core::WindError;
use windvane_core::fixed_point::knots_to_cknots;
use windvane_core::status::OutputReading;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    if let Err(err) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    // Encode needs neither config nor logging.
    if let Commands::Encode {
        angle,
        knots,
        talker,
    } = &cli.cmd
    {
        return encode(*angle, *knots, talker);
    }

    let cfg = load_config(&cli.config, cli.calibration.as_deref())?;
    init_tracing(&cli, &cfg);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        filter_gain = cfg.direction.filter_gain,
        timeout_ms = cfg.timing.timeout_ms,
        update_rate_ms = cfg.timing.update_rate_ms,
        "windvane starting"
    );

    match cli.cmd {
        Commands::Run {
            diagnostic,
            max_cycles,
            sim,
            rt,
            rt_prio,
            rt_lock,
        } => {
            rt::setup_rt_once(rt, rt_prio, rt_lock.unwrap_or_else(RtLock::os_default));
            let args = run::RunArgs {
                diagnostic,
                max_cycles,
                sim,
            };
            let summary = run::run(&cfg, &args)?;
            if summary.send_failures > 0 {
                tracing::warn!(
                    failures = summary.send_failures,
                    "some output could not be delivered"
                );
            }
            Ok(())
        }
        Commands::SelfCheck => self_check(&cfg),
        Commands::Encode { .. } => Ok(()),
    }
}

fn config_error(err: &eyre::Report) -> eyre::Report {
    eyre::Report::new(WindError::Config(format!("{err:#}")))
}

fn load_config(path: &Path, calibration: Option<&Path>) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))
        .map_err(|e| config_error(&e))?;
    let mut cfg = windvane_config::load_toml(&text)
        .wrap_err("parse config TOML")
        .map_err(|e| config_error(&e))?;
    if let Some(csv) = calibration {
        cfg.calibration.segments =
            windvane_config::load_calibration_csv(csv).map_err(|e| config_error(&e))?;
    }
    cfg.validate().map_err(|e| config_error(&e))?;
    Ok(cfg)
}

fn init_tracing(cli: &Cli, cfg: &Config) {
    // RUST_LOG wins, then --log-level, then [logging].level.
    let level = if cli.log_level == "info" {
        cfg.logging.level.as_deref().unwrap_or("info")
    } else {
        cli.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_writer = cfg.logging.file.as_deref().map(|file| {
        let path = Path::new(file);
        let dir = path.parent().filter(|d| !d.as_os_str().is_empty());
        let dir = dir.unwrap_or_else(|| Path::new("."));
        let name = path.file_name().map_or_else(
            || "windvane.log".into(),
            |n| n.to_string_lossy().into_owned(),
        );
        let appender = match cfg.logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        writer
    });

    // Sentences own stdout; logs go to stderr (and the file, if configured).
    let result = match (file_writer, cli.json) {
        (Some(file), true) => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr.and(file))
            .try_init(),
        (Some(file), false) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr.and(file))
            .try_init(),
        (None, true) => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
        (None, false) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    if let Err(e) = result {
        eprintln!("Warning: logging not initialized: {e}");
    }
}

fn encode(angle: u16, knots: f32, talker: &str) -> Result<()> {
    if !knots.is_finite() || knots < 0.0 {
        return Err(eyre::Report::new(WindError::Config(format!(
            "--knots must be a non-negative number, got {knots}"
        ))));
    }
    let t = talker.as_bytes();
    if t.len() != 2 || !t.iter().all(u8::is_ascii_uppercase) {
        return Err(eyre::Report::new(WindError::Config(
            "--talker must be two uppercase ASCII letters".into(),
        )));
    }
    let reading = OutputReading {
        speed_cknots: knots_to_cknots(knots),
        direction_deg: angle,
    };
    let line = windvane_core::mwv_sentence(talker, &reading);
    let mut out = std::io::stdout().lock();
    out.write_all(line.as_bytes())?;
    out.flush()?;
    Ok(())
}

fn self_check(cfg: &Config) -> Result<()> {
    let backend = run::self_check(cfg)?;
    println!(
        "OK backend={backend} speed_in={} dir_in={} transport={:?}",
        cfg.pins.speed_in, cfg.pins.dir_in, cfg.output.transport
    );
    Ok(())
}
