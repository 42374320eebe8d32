//! Raspberry Pi pulse inputs via rppal.

use rppal::gpio::{Gpio, InputPin, Level as PinLevel, Trigger};
use windvane_traits::{EdgeHandler, Level, PulseLine};

use crate::error::{HwError, Result};

/// A BCM pin configured as a pulled-up input, interrupting on falling edges.
pub struct GpioLine {
    pin: InputPin,
    bcm: u8,
}

impl GpioLine {
    pub fn open(bcm: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let pin = gpio
            .get(bcm)
            .map_err(|e| HwError::Gpio(format!("pin {bcm}: {e}")))?
            .into_input_pullup();
        Ok(Self { pin, bcm })
    }
}

impl PulseLine for GpioLine {
    fn subscribe(
        &mut self,
        mut handler: EdgeHandler,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let bcm = self.bcm;
        self.pin
            .set_async_interrupt(Trigger::FallingEdge, move |level| {
                handler(match level {
                    PinLevel::Low => Level::Low,
                    PinLevel::High => Level::High,
                });
            })
            .map_err(|e| HwError::Gpio(format!("pin {bcm}: {e}")))?;
        tracing::debug!(bcm, "falling-edge interrupt armed");
        Ok(())
    }
}
