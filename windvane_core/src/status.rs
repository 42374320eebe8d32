//! Per-cycle results returned from the engine.

/// The published measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputReading {
    /// Hundredths of a knot.
    pub speed_cknots: i32,
    /// Filtered direction in [0, 360).
    pub direction_deg: u16,
}

/// What happened to the direction sample in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionOutcome {
    /// Speed was rejected or idle; direction not looked at.
    NotEvaluated,
    /// The direction edge precedes the speed edge it was measured against.
    Stale,
    Accepted { raw_deg: u16 },
    Rejected { raw_deg: u16 },
}

impl DirectionOutcome {
    /// Raw angle of this cycle, if one was computed.
    pub fn raw_deg(&self) -> Option<u16> {
        match *self {
            Self::Accepted { raw_deg } | Self::Rejected { raw_deg } => Some(raw_deg),
            Self::NotEvaluated | Self::Stale => None,
        }
    }
}

/// Public status of a single measurement cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No speed pulse within the staleness window; speed forced to zero.
    Idle,
    SpeedAccepted(DirectionOutcome),
    /// Outlier; the published reading is unchanged.
    SpeedRejected,
}

impl CycleOutcome {
    pub fn direction(&self) -> DirectionOutcome {
        match *self {
            Self::SpeedAccepted(d) => d,
            Self::Idle | Self::SpeedRejected => DirectionOutcome::NotEvaluated,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SpeedAccepted(_) => "accepted",
            Self::SpeedRejected => "rejected",
        }
    }
}

/// Everything a cycle produced, for the output stage and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Milliseconds since the capture epoch.
    pub timestamp_ms: u64,
    /// Revolutions per 100 s; 0 when idle.
    pub rps: i64,
    /// Calibrated speed before filtering; 0 when idle.
    pub raw_speed_cknots: i32,
    pub outcome: CycleOutcome,
    /// Published reading after this cycle.
    pub reading: OutputReading,
}
