pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Sampled logic level of a pulse input at the time an edge was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Callback invoked from the edge context with the line level sampled right after the edge.
pub type EdgeHandler = Box<dyn FnMut(Level) + Send + 'static>;

/// A falling-edge triggered digital input.
pub trait PulseLine {
    /// Register `handler` to be called on every falling edge. Replaces any previous handler.
    fn subscribe(
        &mut self,
        handler: EdgeHandler,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Best-effort sentence transport. No acknowledgment, no retry.
pub trait SentenceSink {
    fn send(&mut self, sentence: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: SentenceSink + ?Sized> SentenceSink for Box<T> {
    fn send(&mut self, sentence: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).send(sentence)
    }
}

impl<T: PulseLine + ?Sized> PulseLine for Box<T> {
    fn subscribe(
        &mut self,
        handler: EdgeHandler,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).subscribe(handler)
    }
}
