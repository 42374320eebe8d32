//! Output encoding: NMEA MWV sentences and the diagnostic CSV line.
//!
//! Wire format of the sentence:
//! `$<TT>MWV,<angle>.0,R,<speed>,N,A*<CS>\r\n` where speed is knots with one
//! decimal and CS is the XOR of every byte between `$` and `*`, printed as
//! two uppercase hex digits.

use crate::capture::{TRACE_DIRECTION, TRACE_SPEED};
use crate::config::{OutputCfg, OutputMode};
use crate::status::{CycleReport, DirectionOutcome, OutputReading};

/// Raw-direction value printed when the direction edge was out of order.
pub const STALE_DIRECTION_SENTINEL: u16 = 999;

/// XOR-fold of `bytes`.
#[inline]
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc ^ b)
}

/// Checksum over the bytes strictly between the first `$` and the following `*`.
/// `None` when either delimiter is missing.
pub fn sentence_checksum(sentence: &str) -> Option<u8> {
    let start = sentence.find('$')? + 1;
    let end = start + sentence[start..].find('*')?;
    Some(checksum(&sentence.as_bytes()[start..end]))
}

/// Speed in knots with one decimal, from non-negative cknots.
///
/// Rounds the binary value of `cknots / 100.0` to nearest, so exact
/// halves such as 6.25 go to the even digit while 6.65 (stored just
/// above the half) goes up.
pub fn format_knots(speed_cknots: i32) -> String {
    format!("{:.1}", f64::from(speed_cknots.max(0)) / 100.0)
}

/// Full MWV sentence including checksum and CRLF.
pub fn mwv_sentence(talker: &str, reading: &OutputReading) -> String {
    let body = format!(
        "{talker}MWV,{}.0,R,{},N,A",
        reading.direction_deg,
        format_knots(reading.speed_cknots)
    );
    let cs = checksum(body.as_bytes());
    format!("${body}*{cs:02X}\r\n")
}

/// `timestamp_ms,filtered,raw,speed_knots`; speed in whole knots, truncated.
pub fn diagnostic_line(report: &CycleReport) -> String {
    let raw = match report.outcome.direction() {
        DirectionOutcome::Stale => STALE_DIRECTION_SENTINEL,
        other => other.raw_deg().unwrap_or(0),
    };
    format!(
        "{},{},{},{}\n",
        report.timestamp_ms,
        report.reading.direction_deg,
        raw,
        report.reading.speed_cknots / 100
    )
}

/// One line per line bit set in the edge trace mask.
pub fn trace_lines(mask: u8) -> Vec<&'static str> {
    let mut out = Vec::with_capacity(2);
    if mask & TRACE_SPEED != 0 {
        out.push("[INT] WIND\n");
    }
    if mask & TRACE_DIRECTION != 0 {
        out.push("[INT] DIR\n");
    }
    out
}

/// Sentence cadence: the first call always fires, afterwards only when
/// strictly more than `rate_ms` passed since the last firing.
#[derive(Debug, Clone, Copy)]
pub struct OutputThrottle {
    rate_ms: u64,
    last_sent_ms: Option<u64>,
}

impl OutputThrottle {
    pub fn new(rate_ms: u64) -> Self {
        Self {
            rate_ms,
            last_sent_ms: None,
        }
    }

    pub fn ready(&mut self, now_ms: u64) -> bool {
        let due = self
            .last_sent_ms
            .is_none_or(|last| now_ms.saturating_sub(last) > self.rate_ms);
        if due {
            self.last_sent_ms = Some(now_ms);
        }
        due
    }
}

/// Turns cycle reports into the text handed to the transport.
#[derive(Debug, Clone)]
pub struct OutputEncoder {
    mode: OutputMode,
    talker: String,
    throttle: OutputThrottle,
}

impl OutputEncoder {
    pub fn new(output: &OutputCfg, update_rate_ms: u64) -> Self {
        Self {
            mode: output.mode,
            talker: output.talker.clone(),
            throttle: OutputThrottle::new(update_rate_ms),
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Text to send for this cycle, if any. Diagnostic mode emits every cycle;
    /// NMEA mode is rate limited.
    pub fn encode(&mut self, report: &CycleReport) -> Option<String> {
        match self.mode {
            OutputMode::Diagnostic => Some(diagnostic_line(report)),
            OutputMode::Nmea => self
                .throttle
                .ready(report.timestamp_ms)
                .then(|| mwv_sentence(&self.talker, &report.reading)),
        }
    }
}
