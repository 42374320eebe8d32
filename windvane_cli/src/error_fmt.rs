//! Human-readable error descriptions and structured JSON error formatting.

use windvane_core::error::{BuildError, WindError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Calibration CSV header special-case, whatever wraps it
    if err
        .to_string()
        .to_ascii_lowercase()
        .contains("calibration csv must have headers")
    {
        return "Invalid headers in calibration CSV. Expected 'below_rps,a_num,a_den,b_num,b_den,c'."
            .to_string();
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::FilterGain => {
                "What happened: The direction filter gain is out of range.\nLikely causes: direction.filter_gain below 0.0 or above 1.0.\nHow to fix: Use a value in [0.0, 1.0]; 1.0 disables smoothing.".to_string()
            }
            BuildError::Bands(msg) => format!(
                "What happened: Deviation bands are invalid ({msg}).\nLikely causes: Bands out of order, a bounded last band, or a zero limit.\nHow to fix: List [[bands]] in ascending below_knots order and leave below_knots off the last one."
            ),
            BuildError::Calibration(msg) => format!(
                "What happened: Calibration curve is invalid ({msg}).\nLikely causes: Zero denominators, unsorted below_rps, or a bounded last segment.\nHow to fix: Fix the [[calibration.segments]] table or the calibration CSV."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/windvane.toml for a sample."
            ),
        };
    }

    if let Some(we) = err.downcast_ref::<WindError>() {
        return match we {
            WindError::Hardware(msg) | WindError::HardwareFault(msg) => format!(
                "What happened: Pulse inputs could not be set up ({msg}).\nLikely causes: Wrong [pins] numbers, a pin already claimed, or no GPIO permission.\nHow to fix: Check speed_in/dir_in in the config and that the process may access /dev/gpiomem, or run with `run --sim`."
            ),
            WindError::Transport(msg) => format!(
                "What happened: The output transport could not be opened ({msg}).\nLikely causes: Unresolvable output.udp_target or no network.\nHow to fix: Check output.udp_target (host:port) or switch output.transport to \"stdout\"."
            ),
            WindError::Config(msg) => format!(
                "What happened: Configuration is invalid ({msg}).\nLikely causes: Missing [pins], out-of-range values, or a malformed calibration table.\nHow to fix: Edit the TOML config and try again."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable reason tag used in JSON errors.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    match err.downcast_ref::<WindError>() {
        Some(WindError::Config(_)) => "Config",
        Some(WindError::Hardware(_) | WindError::HardwareFault(_)) => "Hardware",
        Some(WindError::Transport(_)) => "Transport",
        None => "Error",
    }
}

/// Exit codes: 2 config, 3 hardware, 4 transport, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match reason_name(err) {
        "Config" => 2,
        "Hardware" => 3,
        "Transport" => 4,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}
