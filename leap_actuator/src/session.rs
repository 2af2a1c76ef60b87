//! Session lifecycle: one pipeline, one open sink, one sample source.
//!
//! Ordering rules:
//!
//! 1. The sink is opened before the session exists. A `Session` is only
//!    ever built around a ready sink.
//! 2. Frames are processed synchronously on the thread that calls
//!    [`Session::handle`].
//! 3. Teardown deregisters the source first, then closes the sink. A closed
//!    sink is never written again, and `Drop` closes it if teardown was
//!    skipped (panic, early return).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use motion_core::{CommandSink, Dispatch, Pipeline};

use crate::config::SessionConfig;
use crate::source::{SourceEvent, SourceHandle};

// ════════════════════════════════════════════════════════════════════════════
// SessionStats
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames:      u64,
    pub sent:        u64,
    pub failed:      u64,
    pub disconnects: u32,
}

impl SessionStats {
    fn record(&mut self, d: Dispatch) {
        self.sent   += d.sent as u64;
        self.failed += d.failed as u64;
    }
}

/// Whether the caller should keep feeding events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control { Continue, Quit }

// ════════════════════════════════════════════════════════════════════════════
// Session
// ════════════════════════════════════════════════════════════════════════════

pub struct Session<P: Pipeline, S: CommandSink<P::Command>> {
    pipeline:  P,
    /// `None` once closed.
    sink:      Option<S>,
    idle_tick: Duration,
    /// Timestamp of the last frame and when it arrived; used to advance the
    /// sensor clock while no frames come in.
    clock:     Option<(i64, Instant)>,
    stats:     SessionStats,
}

impl<P: Pipeline, S: CommandSink<P::Command>> Session<P, S> {
    pub fn new(pipeline: P, sink: S, cfg: &SessionConfig) -> Self {
        info!("{} session started", pipeline.name());
        Session {
            pipeline,
            sink:      Some(sink),
            idle_tick: Duration::from_millis(cfg.idle_tick_ms.max(1)),
            clock:     None,
            stats:     SessionStats::default(),
        }
    }

    pub fn stats(&self)    -> SessionStats { self.stats }
    pub fn pipeline(&self) -> &P           { &self.pipeline }
    pub fn is_closed(&self) -> bool        { self.sink.is_none() }

    /// Process one source event.
    pub fn handle(&mut self, event: SourceEvent) -> Control {
        let sink = match self.sink.as_mut() {
            Some(s) => s,
            None    => return Control::Quit,
        };

        match event {
            SourceEvent::Frame(frame) => {
                self.stats.frames += 1;
                self.clock = Some((frame.timestamp_ms, Instant::now()));
                let d = self.pipeline.on_frame(&frame, sink);
                self.stats.record(d);
            }
            SourceEvent::Connected => {
                info!("sensor connected");
            }
            SourceEvent::Disconnected => {
                info!("sensor disconnected, waiting for it to come back");
                self.stats.disconnects += 1;
                self.clock = None;
                let d = self.pipeline.on_disconnect(sink);
                self.stats.record(d);
            }
            SourceEvent::Quit => {
                debug!("source finished");
                return Control::Quit;
            }
        }
        Control::Continue
    }

    /// Flush scheduled commands that have come due while no frames arrived.
    pub fn tick(&mut self) {
        let (sink, (ts, at)) = match (self.sink.as_mut(), self.clock) {
            (Some(s), Some(c)) => (s, c),
            _ => return,
        };
        let now = ts + at.elapsed().as_millis() as i64;
        let d = self.pipeline.poll(now, sink);
        self.stats.record(d);
    }

    /// Block on `source` until it quits, disconnects its channel, or `quit`
    /// is raised.
    pub fn run(&mut self, source: &SourceHandle, quit: &AtomicBool) {
        while !quit.load(Ordering::Acquire) {
            match source.recv_timeout(self.idle_tick) {
                Ok(event) => {
                    if self.handle(event) == Control::Quit { break; }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("source thread exited");
                    break;
                }
            }
            self.tick();
        }
    }

    /// Deregister the source, flush any pending release, then close the sink.
    pub fn finish(mut self, source: SourceHandle) -> SessionStats {
        source.stop();
        self.close_sink();
        let s = self.stats;
        info!(
            "{} session ended: {} frames, {} commands sent, {} failed, {} disconnects",
            self.pipeline.name(), s.frames, s.sent, s.failed, s.disconnects
        );
        s
    }

    fn close_sink(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            let d = self.pipeline.on_finish(&mut sink);
            self.stats.record(d);
            if let Err(e) = sink.close() {
                warn!("error closing sink: {}", e);
            }
        }
    }
}

impl<P: Pipeline, S: CommandSink<P::Command>> Drop for Session<P, S> {
    fn drop(&mut self) {
        self.close_sink();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
