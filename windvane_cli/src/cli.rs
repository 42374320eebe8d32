//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "windvane", version, about = "Wind speed and direction to NMEA MWV")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/windvane.toml")]
    pub config: PathBuf,

    /// Optional calibration CSV replacing the built-in curve (strict header)
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

impl RtLock {
    #[inline]
    pub fn os_default() -> Self {
        if cfg!(target_os = "linux") {
            RtLock::Current
        } else {
            RtLock::None
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Measure wind and stream sentences until interrupted
    Run {
        /// Emit CSV diagnostic lines instead of MWV sentences (always on stdout)
        #[arg(long, action = ArgAction::SetTrue)]
        diagnostic: bool,
        /// Stop after this many measurement cycles
        #[arg(long, value_name = "N")]
        max_cycles: Option<u64>,
        /// Use the pulse simulator even when GPIO support is compiled in
        #[arg(long, action = ArgAction::SetTrue)]
        sim: bool,
        /// Enable real-time mode (SCHED_FIFO, mlockall)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on supported OSes.\n\nLinux: Attempts SCHED_FIFO priority and mlockall to keep the capture path out of page faults. May require elevated privileges or ulimits (e.g., memlock).\n\nOther OSes: only mlockall is attempted."
        )]
        rt: bool,
        /// Real-time priority for SCHED_FIFO on Linux (1..=max)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
        /// Select memory locking mode for --rt: none, current, or all
        #[arg(long, value_enum, value_name = "MODE")]
        rt_lock: Option<RtLock>,
    },
    /// Print one MWV sentence for a given angle and speed
    Encode {
        /// Relative wind angle in degrees
        #[arg(long, value_parser = clap::value_parser!(u16).range(0..360))]
        angle: u16,
        /// Wind speed in knots
        #[arg(long)]
        knots: f32,
        /// Two-letter talker identifier
        #[arg(long, default_value = "WI")]
        talker: String,
    },
    /// Validate config and report which pulse backend would be used
    SelfCheck,
}
