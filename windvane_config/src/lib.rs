#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and calibration table parsing for the wind instrument.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Calibration CSV loader enforces headers and checks segment ordering.
use serde::Deserialize;

/// One quadratic calibration segment as written in TOML or CSV.
///
/// Evaluates `a_num*rps^2/a_den + b_num*rps/b_den + c` (each term truncated)
/// for `rps < below_rps`. The last segment leaves `below_rps` empty.
///
/// CSV headers:
/// below_rps,a_num,a_den,b_num,b_den,c
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRow {
    pub below_rps: Option<i64>,
    pub a_num: i64,
    pub a_den: i64,
    pub b_num: i64,
    pub b_den: i64,
    pub c: i64,
}

#[derive(Debug, Deserialize)]
pub struct Pins {
    pub speed_in: u8,
    pub dir_in: u8,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CaptureCfg {
    /// Minimum time between accepted edges on one line (microseconds)
    pub debounce_us: u64,
}

impl Default for CaptureCfg {
    fn default() -> Self {
        Self { debounce_us: 10_000 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimingCfg {
    /// No speed pulse for longer than this means zero wind. Also bounds the cycle wait.
    pub timeout_ms: u64,
    /// Minimum spacing between transmitted sentences
    pub update_rate_ms: u64,
    /// Pause after each measurement cycle
    pub cycle_pause_ms: u64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            timeout_ms: 1_500,
            update_rate_ms: 500,
            cycle_pause_ms: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DirectionCfg {
    /// Manual vane offset in degrees
    pub offset_deg: u16,
    /// Low-pass gain on the direction output. Range: 0.0..=1.0, 1.0 disables filtering.
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

/// Deviation limits for one speed range. The last band leaves `below_knots` empty.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct BandCfg {
    pub below_knots: Option<f32>,
    pub speed_dev_knots: f32,
    pub dir_dev_deg: u16,
}

pub fn default_bands() -> Vec<BandCfg> {
    vec![
        BandCfg {
            below_knots: Some(10.0),
            speed_dev_knots: 5.0,
            dir_dev_deg: 25,
        },
        BandCfg {
            below_knots: Some(80.0),
            speed_dev_knots: 10.0,
            dir_dev_deg: 18,
        },
        BandCfg {
            below_knots: None,
            speed_dev_knots: 30.0,
            dir_dev_deg: 10,
        },
    ]
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Optional override of the built-in calibration curve
    pub segments: Vec<SegmentRow>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Nmea,
    Diagnostic,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Stdout,
    Udp,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputCfg {
    pub mode: OutputMode,
    /// Two-letter NMEA talker identifier
    pub talker: String,
    pub transport: TransportKind,
    /// "host:port" for the UDP transport
    pub udp_target: Option<String>,
}

impl Default for OutputCfg {
    fn default() -> Self {
        Self {
            mode: OutputMode::Nmea,
            talker: "WI".to_string(),
            transport: TransportKind::Stdout,
            udp_target: None,
        }
    }
}

/// Pulse simulator used when no GPIO backend is compiled in.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimCfg {
    pub speed_period_ms: u64,
    pub angle_deg: u16,
    /// When non-zero, each simulated speed edge is followed by a bounce edge this many us later
    pub bounce_us: u64,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            speed_period_ms: 333,
            angle_deg: 90,
            bounce_us: 0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub capture: CaptureCfg,
    #[serde(default)]
    pub timing: TimingCfg,
    #[serde(default)]
    pub direction: DirectionCfg,
    #[serde(default = "default_bands")]
    pub bands: Vec<BandCfg>,
    #[serde(default)]
    pub calibration: CalibrationCfg,
    #[serde(default)]
    pub output: OutputCfg,
    #[serde(default)]
    pub sim: SimCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Check that calibration segments have non-zero denominators and strictly
/// ascending upper bounds, with only the last segment unbounded.
pub fn check_segments(rows: &[SegmentRow]) -> eyre::Result<()> {
    if rows.is_empty() {
        eyre::bail!("calibration requires at least one segment");
    }
    let last = rows.len() - 1;
    let mut prev: Option<i64> = None;
    for (i, row) in rows.iter().enumerate() {
        if row.a_den == 0 || row.b_den == 0 {
            eyre::bail!("calibration segment {i} has a zero denominator");
        }
        match (row.below_rps, i == last) {
            (Some(_), true) => eyre::bail!("last calibration segment must be unbounded"),
            (None, false) => eyre::bail!("calibration segment {i} is missing below_rps"),
            (Some(b), false) => {
                if b <= 0 {
                    eyre::bail!("calibration segment {i} below_rps must be > 0");
                }
                if let Some(p) = prev
                    && b <= p
                {
                    eyre::bail!("calibration below_rps must be strictly ascending (segment {i})");
                }
                prev = Some(b);
            }
            (None, true) => {}
        }
    }
    Ok(())
}

pub fn load_calibration_csv(path: &std::path::Path) -> eyre::Result<Vec<SegmentRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["below_rps", "a_num", "a_den", "b_num", "b_den", "c"];
    let actual: Vec<String> = headers.iter().map(|s| s.trim().to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "calibration CSV must have headers '{}', got: {}",
            expected.join(","),
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<SegmentRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    check_segments(&rows)?;
    Ok(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        if self.pins.speed_in == self.pins.dir_in {
            eyre::bail!("pins.speed_in and pins.dir_in must differ");
        }

        // Timing
        if self.timing.timeout_ms == 0 {
            eyre::bail!("timing.timeout_ms must be >= 1");
        }
        if self.timing.timeout_ms > 60_000 {
            eyre::bail!("timing.timeout_ms is unreasonably large (>60s)");
        }
        if self.timing.cycle_pause_ms >= self.timing.timeout_ms {
            eyre::bail!("timing.cycle_pause_ms must be < timing.timeout_ms");
        }

        // Capture
        if self.capture.debounce_us >= self.timing.timeout_ms.saturating_mul(1_000) {
            eyre::bail!("capture.debounce_us must be shorter than timing.timeout_ms");
        }

        // Direction
        if self.direction.offset_deg >= 360 {
            eyre::bail!("direction.offset_deg must be in [0, 360)");
        }
        let gain = self.direction.filter_gain;
        if !(0.0..=1.0).contains(&gain) {
            eyre::bail!("direction.filter_gain must be in [0.0, 1.0]");
        }

        // Bands
        if self.bands.is_empty() {
            eyre::bail!("bands must contain at least one entry");
        }
        let last = self.bands.len() - 1;
        let mut prev = 0.0f32;
        for (i, band) in self.bands.iter().enumerate() {
            if band.speed_dev_knots.is_nan() || band.speed_dev_knots <= 0.0 {
                eyre::bail!("bands[{i}].speed_dev_knots must be > 0");
            }
            if band.dir_dev_deg == 0 || band.dir_dev_deg > 180 {
                eyre::bail!("bands[{i}].dir_dev_deg must be in [1, 180]");
            }
            match (band.below_knots, i == last) {
                (Some(_), true) => eyre::bail!("last band must omit below_knots"),
                (None, false) => eyre::bail!("bands[{i}].below_knots is required"),
                (Some(b), false) => {
                    if b.is_nan() || b <= prev {
                        eyre::bail!("bands[{i}].below_knots must be ascending and > 0");
                    }
                    prev = b;
                }
                (None, true) => {}
            }
        }

        // Calibration override
        if !self.calibration.segments.is_empty() {
            check_segments(&self.calibration.segments)?;
        }

        // Output
        let talker = self.output.talker.as_bytes();
        if talker.len() != 2 || !talker.iter().all(u8::is_ascii_uppercase) {
            eyre::bail!("output.talker must be two uppercase ASCII letters");
        }
        if self.output.transport == TransportKind::Udp && self.output.udp_target.is_none() {
            eyre::bail!("output.udp_target is required when output.transport = \"udp\"");
        }

        // Simulator
        if self.sim.speed_period_ms == 0 {
            eyre::bail!("sim.speed_period_ms must be >= 1");
        }
        if self.sim.angle_deg >= 360 {
            eyre::bail!("sim.angle_deg must be in [0, 360)");
        }

        Ok(())
    }
}
