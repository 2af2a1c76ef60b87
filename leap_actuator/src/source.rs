//! Sample sources: LeapMotion hardware and the simulation window.
//!
//! The public interface is [`SourceEvent`] delivered over a `mpsc` channel.
//! The session doesn't need to know whether frames came from real hardware,
//! the mouse, or a recorded trace.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info};
use motion_core::{GestureEvent, HandFrame, PoseSample, Vector3};

// ════════════════════════════════════════════════════════════════════════════
// SourceEvent
// ════════════════════════════════════════════════════════════════════════════

/// What a source reports to the session.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceEvent {
    /// Sensor (re)attached.
    Connected,
    /// Sensor detached; frames stop until the next `Connected`.
    Disconnected,
    /// One tracking frame.
    Frame(HandFrame),
    /// The source has nothing more to deliver.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// SampleSource trait: unified interface for hw, sim and replay
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`SourceEvent`]s from its own thread.
pub trait SampleSource: Send + 'static {
    fn run(self: Box<Self>, tx: SourceSender);
}

/// Sending half handed to a running source.
///
/// `send` returns false once the session has deregistered; sources treat
/// that as their cue to exit.
#[derive(Clone)]
pub struct SourceSender {
    tx:      Sender<SourceEvent>,
    stopped: Arc<AtomicBool>,
}

impl SourceSender {
    pub fn send(&self, event: SourceEvent) -> bool {
        !self.is_stopped() && self.tx.send(event).is_ok()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Receiving half owned by the session. Dropping it (or calling
/// [`SourceHandle::stop`]) deregisters the listener.
pub struct SourceHandle {
    rx:      Receiver<SourceEvent>,
    stopped: Arc<AtomicBool>,
}

impl SourceHandle {
    pub fn recv_timeout(&self, timeout: Duration) -> Result<SourceEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    pub fn try_recv(&self) -> Result<SourceEvent, TryRecvError> {
        self.rx.try_recv()
    }

    /// Deregister: the source stops delivering and its thread winds down on
    /// its own. Events already queued are discarded.
    pub fn stop(self) {
        self.stopped.store(true, Ordering::Release);
        debug!("sample source deregistered");
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::Release);
    }
}

/// Build a connected sender/handle pair without spawning anything.
pub fn source_channel() -> (SourceSender, SourceHandle) {
    let (tx, rx) = mpsc::channel();
    let stopped = Arc::new(AtomicBool::new(false));
    (
        SourceSender { tx, stopped: Arc::clone(&stopped) },
        SourceHandle { rx, stopped },
    )
}

/// Spawn a sample source on its own thread and return the receiving end.
pub fn spawn_sample_source<S: SampleSource>(source: S) -> SourceHandle {
    let (tx, handle) = source_channel();
    thread::spawn(move || Box::new(source).run(tx));
    handle
}

// ════════════════════════════════════════════════════════════════════════════
// LeapSampleSource: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Sample source backed by a real LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
///
/// LeapC reports palm position, palm velocity and grab strength directly.
/// It has no key-tap gesture, so a tap is synthesised from a quick pinch:
/// pinch strength rising through [`TAP_PINCH_ON`] after having dropped
/// below [`TAP_PINCH_OFF`].
#[cfg(feature = "leap")]
pub struct LeapSampleSource;

#[cfg(feature = "leap")]
pub const TAP_PINCH_ON: f32 = 0.85;
#[cfg(feature = "leap")]
pub const TAP_PINCH_OFF: f32 = 0.5;

#[cfg(feature = "leap")]
impl SampleSource for LeapSampleSource {
    fn run(self: Box<Self>, tx: SourceSender) {
        use leaprs::*;
        use log::error;

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => {
                error!("failed to create LeapC connection: {:?}", e);
                tx.send(SourceEvent::Quit);
                return;
            }
        };
        if let Err(e) = connection.open() {
            error!("failed to open LeapMotion device: {:?}", e);
            tx.send(SourceEvent::Quit);
            return;
        }

        let mut tap = PinchTap::default();

        while !tx.is_stopped() {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };

            let event = match msg.event() {
                Event::Connection(_) | Event::Device(_) => SourceEvent::Connected,
                Event::ConnectionLost(_) | Event::DeviceLost => SourceEvent::Disconnected,
                Event::Tracking(frame) => {
                    // LeapC clock is in microseconds.
                    let ts = frame.info.timestamp / 1000;
                    let hands: Vec<_> = frame.hands().collect();
                    let mut out = HandFrame::empty(ts);
                    if let Some(h) = hands.first() {
                        let p = h.palm().position();
                        let v = h.palm().velocity();
                        out.hands.push(PoseSample::new(
                            Vector3::new(p.x, p.y, p.z),
                            Vector3::new(v.x, v.y, v.z),
                            h.grab_strength,
                            ts,
                        ));
                        if tap.update(h.pinch_strength) {
                            out.gestures.push(GestureEvent::tap(ts));
                        }
                    } else {
                        tap.reset();
                    }
                    SourceEvent::Frame(out)
                }
                _ => continue,
            };

            if !tx.send(event) { return; }
        }
    }
}

/// Rising-edge pinch detector with hysteresis.
#[cfg(feature = "leap")]
#[derive(Default)]
struct PinchTap {
    pinched: bool,
}

#[cfg(feature = "leap")]
impl PinchTap {
    fn update(&mut self, strength: f32) -> bool {
        if !self.pinched && strength > TAP_PINCH_ON {
            self.pinched = true;
            return true;
        }
        if self.pinched && strength < TAP_PINCH_OFF {
            self.pinched = false;
        }
        false
    }

    fn reset(&mut self) { self.pinched = false; }
}

// ════════════════════════════════════════════════════════════════════════════
// SimSampleSource: mouse/keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the simulation window, already in sensor units.
#[derive(Clone, Debug, PartialEq)]
pub enum SimInput {
    /// Palm is over the window at `position` (mm).
    Hand { position: Vector3, grab: bool, t_ms: i64 },
    /// Pointer left the window, no hand in view.
    NoHand { t_ms: i64 },
    /// Tap key pressed; attached to the next hand frame.
    Tap,
    Quit,
}

/// Gesture source driven by [`SimInput`] events from the visualizer.
///
/// The window only knows where the mouse is; this translator derives palm
/// velocity from successive positions so the pipelines see the same shape
/// of data as from hardware.
pub struct SimSampleSource {
    pub rx: Receiver<SimInput>,
}

/// Turns positions into velocities and queues taps.
#[derive(Default)]
pub struct SimTracker {
    last:        Option<(Vector3, i64)>,
    pending_tap: bool,
}

impl SimTracker {
    pub fn translate(&mut self, input: SimInput) -> Option<SourceEvent> {
        match input {
            SimInput::Tap => {
                self.pending_tap = true;
                None
            }
            SimInput::Quit => Some(SourceEvent::Quit),
            SimInput::NoHand { t_ms } => {
                self.last = None;
                Some(SourceEvent::Frame(HandFrame::empty(t_ms)))
            }
            SimInput::Hand { position, grab, t_ms } => {
                let velocity = match self.last {
                    Some((prev, prev_t)) if t_ms > prev_t => {
                        let dt = (t_ms - prev_t) as f32 / 1000.0;
                        Vector3::new(
                            (position.x - prev.x) / dt,
                            (position.y - prev.y) / dt,
                            (position.z - prev.z) / dt,
                        )
                    }
                    _ => Vector3::ZERO,
                };
                self.last = Some((position, t_ms));

                let grab_strength = if grab { 1.0 } else { 0.0 };
                let mut frame = HandFrame::single(PoseSample::new(position, velocity, grab_strength, t_ms));
                if std::mem::take(&mut self.pending_tap) {
                    frame.gestures.push(GestureEvent::tap(t_ms));
                }
                Some(SourceEvent::Frame(frame))
            }
        }
    }
}

impl SampleSource for SimSampleSource {
    fn run(self: Box<Self>, tx: SourceSender) {
        info!("simulation source ready");
        if !tx.send(SourceEvent::Connected) { return; }

        let mut tracker = SimTracker::default();
        for input in self.rx {
            if let Some(event) = tracker.translate(input) {
                let quit = event == SourceEvent::Quit;
                if !tx.send(event) || quit { return; }
            }
        }
        tx.send(SourceEvent::Quit);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
