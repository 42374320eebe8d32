//! Test and helper mocks for windvane_core

use std::sync::{Arc, Mutex, PoisonError};

use windvane_traits::{EdgeHandler, Level, PulseLine, SentenceSink};

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl SentenceSink for NullSink {
    fn send(&mut self, _sentence: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// Keeps every sent string; clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SentenceSink for RecordingSink {
    fn send(&mut self, sentence: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sentence.to_string());
        Ok(())
    }
}

/// A transport that is always down.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingSink;

impl SentenceSink for FailingSink {
    fn send(&mut self, _sentence: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("transport unreachable")))
    }
}

/// A pulse line driven by hand. Clones share the subscribed handler.
#[derive(Default, Clone)]
pub struct ManualLine {
    handler: Arc<Mutex<Option<EdgeHandler>>>,
}

impl ManualLine {
    /// Deliver one edge; returns false when nothing is subscribed.
    pub fn fire(&self, level: Level) -> bool {
        let mut guard = self.handler.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(h) => {
                h(level);
                true
            }
            None => false,
        }
    }
}

impl PulseLine for ManualLine {
    fn subscribe(
        &mut self,
        handler: EdgeHandler,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = Some(handler);
        Ok(())
    }
}

/// A line whose subscription always fails, as when a pin cannot be claimed.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableLine;

impl PulseLine for UnavailableLine {
    fn subscribe(
        &mut self,
        _handler: EdgeHandler,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("pin busy")))
    }
}
