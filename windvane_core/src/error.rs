use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum WindError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("filter gain must be in [0.0, 1.0]")]
    FilterGain,
    #[error("invalid deviation bands: {0}")]
    Bands(&'static str),
    #[error("invalid calibration curve: {0}")]
    Calibration(&'static str),
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
