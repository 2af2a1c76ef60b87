//! Command sinks the binary can open: a serial device node, or stdout for
//! dry runs.
//!
//! Line settings (baud, parity, stop bits) are whatever the device node is
//! already configured with. Set them with `stty` or the OS device manager.
//! The microcontroller firmware reads each write as one command.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::info;
use motion_core::{Command, CommandSink, SinkError, WireSink};

/// Boxed sink handed to a session.
pub type BoxedSink<C> = Box<dyn CommandSink<C> + Send>;

/// Where commands go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkTarget {
    /// Serial device node.
    Serial(PathBuf),
    /// Print to stdout instead of driving hardware.
    DryRun,
}

impl fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkTarget::Serial(path) => write!(f, "serial port {}", path.display()),
            SinkTarget::DryRun       => write!(f, "stdout"),
        }
    }
}

/// Open the sink for `target`, boxed for whichever command type the
/// session's pipeline produces.
pub fn open_sink<C: Command>(target: &SinkTarget) -> io::Result<BoxedSink<C>> {
    match target {
        SinkTarget::Serial(path) => Ok(Box::new(open_serial_sink(path)?)),
        SinkTarget::DryRun => {
            info!("dry run, commands go to stdout");
            Ok(Box::new(EchoSink::stdout()))
        }
    }
}

/// Open a serial device node (e.g. `/dev/ttyACM0`, `COM3`) for writing.
pub fn open_serial_sink(path: impl AsRef<Path>) -> io::Result<WireSink<File>> {
    let path = path.as_ref();
    let port = OpenOptions::new().write(true).open(path)?;
    info!("opened serial port {}", path.display());
    Ok(WireSink::new(port))
}

// ════════════════════════════════════════════════════════════════════════════
// EchoSink: one command per line, for --dry-run
// ════════════════════════════════════════════════════════════════════════════

/// Prints each command's wire string on its own line.
pub struct EchoSink<W: Write> {
    out:    W,
    closed: bool,
}

impl<W: Write> EchoSink<W> {
    pub fn new(out: W) -> Self {
        EchoSink { out, closed: false }
    }

    pub fn into_inner(self) -> W { self.out }
}

impl EchoSink<io::Stdout> {
    pub fn stdout() -> Self {
        EchoSink::new(io::stdout())
    }
}

impl<C: Command, W: Write> CommandSink<C> for EchoSink<W> {
    fn send(&mut self, cmd: &C) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        writeln!(self.out, "{}", cmd)?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.closed = true;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion_core::{ArmCommand, PointerCommand};

    #[test]
    fn echo_sink_one_command_per_line() {
        let mut sink = EchoSink::new(Vec::new());
        sink.send(&PointerCommand::click_press()).unwrap();
        sink.send(&ArmCommand { grab: 5, base: 1, vertical: 2, front_back: 3 }).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "0,0,0,0,1\n5,1,2,3\n");
    }

    #[test]
    fn echo_sink_closed_rejects() {
        let mut sink = EchoSink::new(Vec::new());
        CommandSink::<ArmCommand>::close(&mut sink).unwrap();
        assert!(matches!(sink.send(&ArmCommand::default()), Err(SinkError::Closed)));
    }

    #[test]
    fn serial_sink_writes_raw_commands() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut sink = open_serial_sink(file.path()).unwrap();
        sink.send(&ArmCommand { grab: 30, base: 0, vertical: 120, front_back: 60 }).unwrap();
        CommandSink::<ArmCommand>::close(&mut sink).unwrap();
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "30,0,120,60");
    }

    #[test]
    fn open_sink_by_target() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let target = SinkTarget::Serial(file.path().to_path_buf());
        let mut sink = open_sink::<PointerCommand>(&target).unwrap();
        sink.send(&PointerCommand::click_press()).unwrap();
        sink.close().unwrap();
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "0,0,0,0,1");

        assert!(open_sink::<ArmCommand>(&SinkTarget::DryRun).is_ok());
    }

    #[test]
    fn missing_port_is_an_error() {
        assert!(open_serial_sink("/nonexistent/tty-for-test").is_err());
    }
}
