//! Sentence transports. Fire-and-forget: no acknowledgment, no retry.

use std::io::Write;
use std::net::UdpSocket;

use windvane_traits::SentenceSink;

use crate::error::{HwError, Result};

/// Writes each sentence to a `Write` and flushes it.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    out: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Sink on the process stdout.
pub fn stdout_sink() -> WriterSink<std::io::Stdout> {
    WriterSink::new(std::io::stdout())
}

impl<W: Write> SentenceSink for WriterSink<W> {
    fn send(
        &mut self,
        sentence: &str,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.out
            .write_all(sentence.as_bytes())
            .and_then(|()| self.out.flush())
            .map_err(|e| HwError::Transport(e.to_string()).into())
    }
}

/// Datagram per sentence to a fixed peer. The socket is non-blocking, so a
/// full send buffer drops the sentence instead of stalling the cycle.
#[derive(Debug)]
pub struct UdpSink {
    socket: UdpSocket,
    target: String,
}

impl UdpSink {
    /// Bind an ephemeral local port and connect it to `target` ("host:port").
    pub fn connect(target: &str) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket
            .connect(target)
            .map_err(|e| HwError::Transport(format!("cannot reach {target}: {e}")))?;
        socket.set_nonblocking(true)?;
        tracing::info!(target, "udp transport ready");
        Ok(Self {
            socket,
            target: target.to_string(),
        })
    }
}

impl SentenceSink for UdpSink {
    fn send(
        &mut self,
        sentence: &str,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.socket
            .send(sentence.as_bytes())
            .map(|_| ())
            .map_err(|e| HwError::Transport(format!("{}: {e}", self.target)).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_sink_passes_bytes_through() {
        let mut sink = WriterSink::new(Vec::new());
        sink.send("$WIMWV,0.0,R,0.0,N,A*00\r\n").unwrap();
        sink.send("x").unwrap();
        assert_eq!(sink.into_inner(), b"$WIMWV,0.0,R,0.0,N,A*00\r\nx");
    }
}
