//! Message sinks
//!
//! Messages are written as soon as they are produced so that a consumer
//! sees every checkpoint even when a later stream fails.

use super::message::Message;
use crate::error::Result;
use std::io::Write;

/// Destination for the message stream
pub trait MessageSink {
    /// Write one message
    fn write(&mut self, message: &Message) -> Result<()>;
}

/// Collects messages in memory
impl MessageSink for Vec<Message> {
    fn write(&mut self, message: &Message) -> Result<()> {
        self.push(message.clone());
        Ok(())
    }
}

/// Writes newline-delimited JSON, flushing after every message
#[derive(Debug)]
pub struct JsonLinesWriter<W: Write> {
    inner: W,
    written: usize,
}

impl JsonLinesWriter<std::io::Stdout> {
    /// Writer on standard output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> JsonLinesWriter<W> {
    /// Wrap a writer
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Messages written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Unwrap the inner writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> MessageSink for JsonLinesWriter<W> {
    fn write(&mut self, message: &Message) -> Result<()> {
        let line = message.to_json_line()?;
        writeln!(self.inner, "{line}")?;
        self.inner.flush()?;
        self.written += 1;
        Ok(())
    }
}
