//! Common time and integer helpers for windvane_core.

/// Number of microseconds in one millisecond.
pub const MICROS_PER_MILLI: u64 = 1_000;
/// Degrees in a full turn of the vane.
pub const FULL_TURN_DEG: i32 = 360;

/// Convert milliseconds to microseconds, saturating on overflow.
#[inline]
pub fn ms_to_us(ms: u64) -> u64 {
    ms.saturating_mul(MICROS_PER_MILLI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ms_to_us_saturates() {
        assert_eq!(ms_to_us(1_500), 1_500_000);
        assert_eq!(ms_to_us(u64::MAX), u64::MAX);
    }
}
