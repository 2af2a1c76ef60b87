//! Per-frame orchestration: debounce → transform → rate-limit → sink.
//!
//! A pipeline instance owns all mutable actuator state (frame counter,
//! last tap, pending click release) and is driven from a single thread,
//! whichever thread delivers sensor frames. Nothing here blocks: the tap
//! click's hold period is a scheduled release, flushed by the next frame or
//! [`Pipeline::poll`] call at or after its due time.

use log::{debug, trace, warn};

use crate::arm::{scale_grab, ArmCommand, ArmConfig, ArmTransform};
use crate::debounce::TapDebouncer;
use crate::limiter::RateLimiter;
use crate::pointer::{PointerCommand, PointerConfig, PointerTransform};
use crate::pose::HandFrame;
use crate::sink::{Command, CommandSink};

// ════════════════════════════════════════════════════════════════════════════
// Dispatch: what one call put on the wire
// ════════════════════════════════════════════════════════════════════════════

/// Send accounting for a single pipeline call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub sent:   u32,
    pub failed: u32,
}

impl Dispatch {
    pub fn is_empty(&self) -> bool { self.sent == 0 && self.failed == 0 }
}

impl std::ops::AddAssign for Dispatch {
    fn add_assign(&mut self, rhs: Dispatch) {
        self.sent   += rhs.sent;
        self.failed += rhs.failed;
    }
}

/// Fire-and-forget transmit: a failed send is logged and dropped; the next
/// command carries the full target state anyway.
fn transmit<C: Command>(sink: &mut dyn CommandSink<C>, cmd: C, out: &mut Dispatch) {
    match sink.send(&cmd) {
        Ok(()) => {
            trace!("sent {}", cmd);
            out.sent += 1;
        }
        Err(e) => {
            warn!("dropping command {}: {}", cmd, e);
            out.failed += 1;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Pipeline trait
// ════════════════════════════════════════════════════════════════════════════

/// Shared shape of the pointer and arm pipelines.
pub trait Pipeline: Send {
    type Command: Command;

    /// Short name for logs ("pointer", "arm").
    fn name(&self) -> &'static str;

    /// Process one sensor frame.
    fn on_frame(&mut self, frame: &HandFrame, sink: &mut dyn CommandSink<Self::Command>) -> Dispatch;

    /// Flush anything scheduled at or before `now_ms`. Called while no
    /// frames are arriving.
    fn poll(&mut self, _now_ms: i64, _sink: &mut dyn CommandSink<Self::Command>) -> Dispatch {
        Dispatch::default()
    }

    /// Sensor went away: drop partial state, leave the actuator in a
    /// neutral state where that matters.
    fn on_disconnect(&mut self, sink: &mut dyn CommandSink<Self::Command>) -> Dispatch;

    /// Session is ending: send whatever must reach the actuator before the
    /// sink closes.
    fn on_finish(&mut self, _sink: &mut dyn CommandSink<Self::Command>) -> Dispatch {
        Dispatch::default()
    }

    /// True while a click press is waiting for its release.
    fn click_pending(&self) -> bool { false }
}

// ════════════════════════════════════════════════════════════════════════════
// PointerPipeline
// ════════════════════════════════════════════════════════════════════════════

/// Hand velocity → mouse deltas; debounced taps → click press/release.
pub struct PointerPipeline {
    debouncer:     TapDebouncer,
    transform:     PointerTransform,
    limiter:       RateLimiter,
    click_hold_ms: i64,
    /// Due time of the release half of an in-progress tap click.
    release_at:    Option<i64>,
}

impl PointerPipeline {
    pub fn new(cfg: &PointerConfig) -> Self {
        PointerPipeline {
            debouncer:     TapDebouncer::new(cfg.tap_cool_down_ms),
            transform:     PointerTransform::new(cfg),
            limiter:       RateLimiter::new(cfg.send_threshold),
            click_hold_ms: cfg.click_hold_ms.max(0),
            release_at:    None,
        }
    }

    /// Seed the debouncer as if a tap had fired at `last_tap_ms`.
    pub fn with_last_tap(mut self, last_tap_ms: i64) -> Self {
        self.debouncer = TapDebouncer::with_last_fire(self.debouncer.cool_down_ms(), last_tap_ms);
        self
    }

    pub fn frame_count(&self) -> u32 { self.limiter.count() }

    /// Send the release if it is due. Returns true while a click sequence
    /// owns this frame (release still pending, or released just now).
    fn settle_click(
        &mut self,
        now_ms: i64,
        sink:   &mut dyn CommandSink<PointerCommand>,
        out:    &mut Dispatch,
    ) -> bool {
        match self.release_at {
            None => false,
            Some(due) if now_ms >= due => {
                self.release_at = None;
                let release = self.limiter.offer(Some(PointerCommand::click_release()), true);
                if let Some(cmd) = release {
                    transmit(sink, cmd, out);
                }
                true
            }
            Some(_) => true,
        }
    }
}

impl Default for PointerPipeline {
    fn default() -> Self {
        PointerPipeline::new(&PointerConfig::default())
    }
}

impl Pipeline for PointerPipeline {
    type Command = PointerCommand;

    fn name(&self) -> &'static str { "pointer" }

    fn click_pending(&self) -> bool { self.release_at.is_some() }

    /// A frame that arrives while a release is pending, or that sends the
    /// release, is consumed whole: its tap and movement are dropped.
    fn on_frame(&mut self, frame: &HandFrame, sink: &mut dyn CommandSink<PointerCommand>) -> Dispatch {
        let mut out = Dispatch::default();
        let now = frame.timestamp_ms;

        if self.settle_click(now, sink, &mut out) {
            return out;
        }

        let hand = match frame.primary_hand() {
            Some(h) => h,
            None    => return out,
        };

        if self.debouncer.should_fire(&frame.gestures, now) {
            debug!("tap at {} ms, click for {} ms", now, self.click_hold_ms);
            if let Some(cmd) = self.limiter.offer(Some(PointerCommand::click_press()), true) {
                transmit(sink, cmd, &mut out);
            }
            self.release_at = Some(now + self.click_hold_ms);
            return out;
        }

        let cmd = self.transform.transform(hand.velocity, hand.grab_strength);
        if let Some(cmd) = self.limiter.offer(cmd, false) {
            transmit(sink, cmd, &mut out);
        }
        out
    }

    fn poll(&mut self, now_ms: i64, sink: &mut dyn CommandSink<PointerCommand>) -> Dispatch {
        let mut out = Dispatch::default();
        self.settle_click(now_ms, sink, &mut out);
        out
    }

    fn on_disconnect(&mut self, sink: &mut dyn CommandSink<PointerCommand>) -> Dispatch {
        let mut out = Dispatch::default();
        self.limiter.reset();
        if self.release_at.take().is_some() {
            debug!("sensor lost mid-click, releasing early");
            transmit(sink, PointerCommand::click_release(), &mut out);
        }
        out
    }

    fn on_finish(&mut self, sink: &mut dyn CommandSink<PointerCommand>) -> Dispatch {
        let mut out = Dispatch::default();
        if self.release_at.take().is_some() {
            debug!("session ending mid-click, releasing early");
            transmit(sink, PointerCommand::click_release(), &mut out);
        }
        out
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ArmPipeline
// ════════════════════════════════════════════════════════════════════════════

/// Hand position + grab → servo angles. Gestures are ignored.
pub struct ArmPipeline {
    transform: ArmTransform,
    limiter:   RateLimiter,
}

impl ArmPipeline {
    pub fn new(cfg: &ArmConfig) -> Self {
        ArmPipeline {
            transform: ArmTransform::new(cfg),
            limiter:   RateLimiter::new(cfg.send_threshold),
        }
    }

    pub fn frame_count(&self) -> u32 { self.limiter.count() }
}

impl Default for ArmPipeline {
    fn default() -> Self {
        ArmPipeline::new(&ArmConfig::default())
    }
}

impl Pipeline for ArmPipeline {
    type Command = ArmCommand;

    fn name(&self) -> &'static str { "arm" }

    fn on_frame(&mut self, frame: &HandFrame, sink: &mut dyn CommandSink<ArmCommand>) -> Dispatch {
        let mut out = Dispatch::default();
        let hand = match frame.primary_hand() {
            Some(h) => h,
            None    => return out,
        };

        let grab = scale_grab(hand.grab_strength);
        let cmd  = self.transform.transform(hand.velocity, hand.position, grab);
        if let Some(cmd) = self.limiter.offer(cmd, false) {
            transmit(sink, cmd, &mut out);
        }
        out
    }

    fn on_disconnect(&mut self, _sink: &mut dyn CommandSink<ArmCommand>) -> Dispatch {
        self.limiter.reset();
        Dispatch::default()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{GestureEvent, PoseSample, Vector3};
    use crate::sink::MemorySink;

    fn moving(t: i64) -> HandFrame {
        HandFrame::single(PoseSample::new(
            Vector3::new(0.0, 150.0, 0.0),
            Vector3::new(150.0, 0.0, 0.0),
            0.0,
            t,
        ))
    }

    fn tap(t: i64) -> HandFrame {
        moving(t).with_gesture(GestureEvent::tap(t))
    }

    // ── pointer ──────────────────────────────────────────────────────────
    #[test]
    fn tap_press_then_scheduled_release() {
        let mut p = PointerPipeline::default().with_last_tap(-600);
        let mut sink = MemorySink::new();

        let d = p.on_frame(&tap(0), &mut sink);
        assert_eq!(d.sent, 1);
        assert_eq!(sink.sent, vec![PointerCommand::click_press()]);
        assert!(p.click_pending());

        assert!(p.poll(99, &mut sink).is_empty());
        assert_eq!(p.poll(100, &mut sink).sent, 1);
        assert_eq!(sink.wire_strings(), vec!["0,0,0,0,1", "0,0,0,0,0"]);
        assert_eq!(p.frame_count(), 0);
    }

    #[test]
    fn movement_suppressed_during_hold() {
        let mut p = PointerPipeline::default();
        let mut sink = MemorySink::new();
        p.on_frame(&tap(0), &mut sink);
        for t in (10..100).step_by(10) {
            p.on_frame(&moving(t), &mut sink);
        }
        assert_eq!(p.frame_count(), 0);
        assert_eq!(sink.sent.len(), 1);

        // The frame that releases is consumed by the release.
        p.on_frame(&moving(100), &mut sink);
        assert_eq!(sink.sent.last(), Some(&PointerCommand::click_release()));
        assert_eq!(p.frame_count(), 0);

        p.on_frame(&moving(110), &mut sink);
        assert_eq!(p.frame_count(), 1);
    }

    #[test]
    fn tap_counter_preserved() {
        let mut p = PointerPipeline::default();
        let mut sink = MemorySink::new();
        p.on_frame(&moving(0), &mut sink);
        p.on_frame(&moving(1), &mut sink);
        p.on_frame(&tap(2), &mut sink);
        p.poll(200, &mut sink);
        assert_eq!(p.frame_count(), 2);
    }

    #[test]
    fn repeated_tap_frames_debounced() {
        let mut p = PointerPipeline::default();
        let mut sink = MemorySink::new();
        p.on_frame(&tap(0), &mut sink);
        p.on_frame(&tap(150), &mut sink); // releases
        p.on_frame(&tap(400), &mut sink); // inside cool-down → movement
        assert_eq!(
            sink.sent,
            vec![PointerCommand::click_press(), PointerCommand::click_release()]
        );
        p.on_frame(&tap(501), &mut sink);
        assert_eq!(sink.sent.last(), Some(&PointerCommand::click_press()));
    }

    #[test]
    fn tap_without_hand_is_ignored() {
        let mut p = PointerPipeline::default();
        let mut sink = MemorySink::new();
        let frame = HandFrame::empty(0).with_gesture(GestureEvent::tap(0));
        assert!(p.on_frame(&frame, &mut sink).is_empty());
        assert!(!p.click_pending());
    }

    #[test]
    fn failed_send_counted_not_retried() {
        let mut p = PointerPipeline::default();
        let mut sink = MemorySink::new();
        sink.fail = true;
        let mut total = Dispatch::default();
        for t in 0..5 {
            total += p.on_frame(&moving(t), &mut sink);
        }
        assert_eq!(total, Dispatch { sent: 0, failed: 1 });
        sink.fail = false;
        for t in 5..10 {
            total += p.on_frame(&moving(t), &mut sink);
        }
        assert_eq!(total.sent, 1);
    }

    #[test]
    fn disconnect_releases_pending_click() {
        let mut p = PointerPipeline::default();
        let mut sink = MemorySink::new();
        p.on_frame(&moving(0), &mut sink);
        p.on_frame(&tap(1), &mut sink);
        p.on_disconnect(&mut sink);
        assert!(!p.click_pending());
        assert_eq!(p.frame_count(), 0);
        assert_eq!(sink.sent.last(), Some(&PointerCommand::click_release()));
    }

    #[test]
    fn finish_releases_pending_click() {
        let mut p = PointerPipeline::default();
        let mut sink = MemorySink::new();
        p.on_frame(&tap(0), &mut sink);
        assert_eq!(p.on_finish(&mut sink).sent, 1);
        assert!(!p.click_pending());
        assert_eq!(sink.sent, vec![PointerCommand::click_press(), PointerCommand::click_release()]);
        assert!(p.on_finish(&mut sink).is_empty());
    }

    // ── arm ──────────────────────────────────────────────────────────────
    #[test]
    fn arm_uses_first_hand_only() {
        let mut p = ArmPipeline::new(&ArmConfig { send_threshold: 0, ..ArmConfig::default() });
        let mut sink = MemorySink::new();
        let first  = PoseSample::new(Vector3::new(0.0, 125.0, 0.0), Vector3::new(1.0, 0.0, 0.0), 1.0, 0);
        let second = PoseSample::new(Vector3::new(90.0, 80.0, 30.0), Vector3::new(1.0, 0.0, 0.0), 0.0, 0);
        let frame = HandFrame { timestamp_ms: 0, hands: vec![first, second], gestures: vec![] };
        p.on_frame(&frame, &mut sink);
        assert_eq!(sink.sent, vec![ArmCommand { grab: 55, base: 90, vertical: 75, front_back: 30 }]);
    }

    #[test]
    fn arm_ignores_taps_and_still_frames() {
        let mut p = ArmPipeline::default();
        let mut sink = MemorySink::new();
        let still = HandFrame::single(PoseSample::new(Vector3::new(0.0, 120.0, 0.0), Vector3::ZERO, 0.0, 0))
            .with_gesture(GestureEvent::tap(0));
        for _ in 0..50 {
            p.on_frame(&still, &mut sink);
        }
        assert!(sink.sent.is_empty());
        assert_eq!(p.frame_count(), 0);
    }
}
