//! The transport seam: anything that can put a command on the wire.
//!
//! The core never touches serial ports. It hands finished commands to a
//! [`CommandSink`]; the application decides whether that is a serial device
//! node, stdout, or an in-memory recorder.

use std::fmt::{Debug, Display};
use std::io::{self, Write};

use thiserror::Error;

/// A finished actuator command.
///
/// `Display` must produce the exact wire string: comma-separated decimal
/// fields in the pipeline's fixed order, no terminator.
pub trait Command: Display + Debug + Copy + Send + 'static {}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("write failed: {0}")]
    Io(#[from] io::Error),

    #[error("sink already closed")]
    Closed,
}

/// Serializes and transmits commands.
pub trait CommandSink<C: Command> {
    fn send(&mut self, cmd: &C) -> Result<(), SinkError>;

    /// Release the underlying transport. Further sends fail with
    /// [`SinkError::Closed`].
    fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<C: Command, S: CommandSink<C> + ?Sized> CommandSink<C> for Box<S> {
    fn send(&mut self, cmd: &C) -> Result<(), SinkError> { (**self).send(cmd) }
    fn close(&mut self) -> Result<(), SinkError>         { (**self).close() }
}

// ════════════════════════════════════════════════════════════════════════════
// WireSink: Display → bytes over any writer
// ════════════════════════════════════════════════════════════════════════════

/// Writes each command's wire string to `W` and flushes.
///
/// Dropping the writer closes the transport, so `close` simply drops it.
pub struct WireSink<W: Write> {
    writer: Option<W>,
}

impl<W: Write> WireSink<W> {
    pub fn new(writer: W) -> Self {
        WireSink { writer: Some(writer) }
    }

    pub fn is_closed(&self) -> bool { self.writer.is_none() }

    /// Take the writer back, e.g. to inspect what was written.
    pub fn into_inner(self) -> Option<W> { self.writer }
}

impl<C: Command, W: Write> CommandSink<C> for WireSink<W> {
    fn send(&mut self, cmd: &C) -> Result<(), SinkError> {
        let w = self.writer.as_mut().ok_or(SinkError::Closed)?;
        write!(w, "{}", cmd)?;
        w.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if let Some(mut w) = self.writer.take() {
            w.flush()?;
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MemorySink: records what would have been sent
// ════════════════════════════════════════════════════════════════════════════

/// Keeps every sent command in order.
#[derive(Debug)]
pub struct MemorySink<C> {
    pub sent:   Vec<C>,
    /// When set, every send fails with an I/O error (and is not recorded).
    pub fail:   bool,
    closed:     bool,
}

impl<C> MemorySink<C> {
    pub fn new() -> Self {
        MemorySink { sent: Vec::new(), fail: false, closed: false }
    }

    pub fn is_closed(&self) -> bool { self.closed }

    pub fn wire_strings(&self) -> Vec<String>
    where
        C: Display,
    {
        self.sent.iter().map(|c| c.to_string()).collect()
    }
}

impl<C> Default for MemorySink<C> {
    fn default() -> Self { MemorySink::new() }
}

impl<C: Command> CommandSink<C> for MemorySink<C> {
    fn send(&mut self, cmd: &C) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        if self.fail {
            return Err(SinkError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "simulated failure")));
        }
        self.sent.push(*cmd);
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::ArmCommand;
    use crate::pointer::PointerCommand;

    #[test]
    fn wire_sink_writes_without_terminator() {
        let mut sink = WireSink::new(Vec::new());
        sink.send(&PointerCommand::click_press()).unwrap();
        sink.send(&ArmCommand { grab: 5, base: 90, vertical: 75, front_back: 30 }).unwrap();
        let bytes = sink.into_inner().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "0,0,0,0,15,90,75,30");
    }

    #[test]
    fn wire_sink_rejects_after_close() {
        let mut sink = WireSink::new(Vec::new());
        CommandSink::<PointerCommand>::close(&mut sink).unwrap();
        assert!(sink.is_closed());
        let err = sink.send(&PointerCommand::click_release()).unwrap_err();
        assert!(matches!(err, SinkError::Closed));
    }

    #[test]
    fn memory_sink_failure_not_recorded() {
        let mut sink = MemorySink::new();
        sink.fail = true;
        assert!(sink.send(&PointerCommand::click_press()).is_err());
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn boxed_sink_forwards() {
        let mut sink: Box<dyn CommandSink<ArmCommand>> = Box::new(MemorySink::new());
        sink.send(&ArmCommand::default()).unwrap();
        sink.close().unwrap();
        assert!(sink.send(&ArmCommand::default()).is_err());
    }
}
