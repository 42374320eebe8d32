//! Pulse sources and sentence transports for the wind instrument.
//!
//! - `sim`: background-thread pulse simulator (always available)
//! - `gpio`: rppal falling-edge inputs (`hardware` feature, Linux only)
//! - `sink`: stdout and UDP transports

pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
pub mod sim;
pub mod sink;

pub use sim::{SimLine, SimulatedAnemometer};
pub use sink::{UdpSink, WriterSink, stdout_sink};

use windvane_traits::PulseLine;

/// Boxed pulse line, as picked at startup.
pub type DynLine = Box<dyn PulseLine + Send>;

/// Open both hardware inputs (speed, direction).
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn open_gpio_lines(speed_bcm: u8, dir_bcm: u8) -> error::Result<(DynLine, DynLine)> {
    let speed = gpio::GpioLine::open(speed_bcm)?;
    let dir = gpio::GpioLine::open(dir_bcm)?;
    Ok((Box::new(speed), Box::new(dir)))
}

/// Whether this build can drive real GPIO.
pub const fn has_gpio_backend() -> bool {
    cfg!(all(feature = "hardware", target_os = "linux"))
}
