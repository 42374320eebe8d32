//! Fixed-point helpers for speed in centiknots.
//!
//! Speeds are carried as `i32` hundredths of a knot (cknots) from
//! calibration through the deviation filter.

/// Absolute difference of two i32 values as u32 without overflow.
///
/// Uses 64-bit intermediates to avoid overflow during subtraction.
/// For any `i32` inputs, `|a - b| <= u32::MAX`, so the cast is always lossless.
#[inline]
pub fn abs_diff_i32_u32(a: i32, b: i32) -> u32 {
    let diff = (a as i64) - (b as i64);
    diff.unsigned_abs() as u32
}

/// Convert knots (f32) to centiknots via rounding. Non-finite values map to 0.
#[inline]
pub fn knots_to_cknots(knots: f32) -> i32 {
    if !knots.is_finite() {
        return 0;
    }
    let scaled = (knots * 100.0).round();
    if scaled >= i32::MAX as f32 {
        i32::MAX
    } else if scaled <= i32::MIN as f32 {
        i32::MIN
    } else {
        scaled as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abs_diff_handles_extremes_losslessly() {
        assert_eq!(abs_diff_i32_u32(i32::MIN, i32::MAX), u32::MAX);
        assert_eq!(abs_diff_i32_u32(123, -456), 579);
        assert_eq!(abs_diff_i32_u32(-456, 123), 579);
    }

    #[test]
    fn knots_conversions() {
        assert_eq!(knots_to_cknots(5.0), 500);
        assert_eq!(knots_to_cknots(12.345), 1_235);
        assert_eq!(knots_to_cknots(f32::INFINITY), 0);
    }
}
