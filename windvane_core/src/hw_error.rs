//! Maps `Box<dyn Error>` from trait boundaries to typed `WindError`.
//!
//! The traits in `windvane_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `windvane_hardware::HwError` downcasting.

use crate::error::WindError;

/// Map a trait-boundary error to a typed `WindError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> WindError {
    #[cfg(feature = "hardware-errors")]
    {
        use windvane_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Gpio(msg) => WindError::Hardware(msg.clone()),
                HwError::Transport(msg) => WindError::Transport(msg.clone()),
                other => WindError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("socket") || lower.contains("transport") {
        WindError::Transport(s)
    } else {
        WindError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_message_heuristics() {
        let e = std::io::Error::other("socket closed");
        assert!(matches!(map_hw_error(&e), WindError::Transport(_)));
        let e = std::io::Error::other("pin busy");
        assert!(matches!(map_hw_error(&e), WindError::Hardware(m) if m == "pin busy"));
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn downcasts_hw_error() {
        use windvane_hardware::error::HwError;
        let e = HwError::Gpio("pin 17 unavailable".into());
        assert!(matches!(map_hw_error(&e), WindError::Hardware(_)));
        let e = HwError::Transport("unreachable".into());
        assert!(matches!(map_hw_error(&e), WindError::Transport(_)));
    }
}
