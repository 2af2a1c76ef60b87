//! Sensor-side data model: what one frame of hand tracking looks like once
//! it has left the driver.
//!
//! Units follow the LeapMotion convention: millimetres for positions,
//! millimetres per second for velocities, milliseconds for timestamps.

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Vector3
// ════════════════════════════════════════════════════════════════════════════

/// A 3-component vector in sensor space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vector3 { x, y, z }
    }
}

impl From<[f32; 3]> for Vector3 {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Vector3 { x, y, z }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PoseSample
// ════════════════════════════════════════════════════════════════════════════

/// One hand's pose within a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    /// Palm centre.
    pub position:      Vector3,
    /// Palm velocity.
    pub velocity:      Vector3,
    /// 0.0 = open hand, 1.0 = fist.
    pub grab_strength: f32,
    pub timestamp_ms:  i64,
}

impl PoseSample {
    pub fn new(position: Vector3, velocity: Vector3, grab_strength: f32, timestamp_ms: i64) -> Self {
        PoseSample { position, velocity, grab_strength, timestamp_ms }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureEvent
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureKind {
    /// Short downward finger poke ("key tap").
    Tap,
}

/// A discrete gesture detected by the sensor collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureEvent {
    pub kind:         GestureKind,
    pub timestamp_ms: i64,
}

impl GestureEvent {
    pub fn tap(timestamp_ms: i64) -> Self {
        GestureEvent { kind: GestureKind::Tap, timestamp_ms }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandFrame
// ════════════════════════════════════════════════════════════════════════════

/// Everything the sensor reported for one tracking frame.
///
/// Pipelines only ever look at the first hand; the sensor orders hands by
/// detection, so `hands[0]` is the one that entered the field of view first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandFrame {
    pub timestamp_ms: i64,
    pub hands:        Vec<PoseSample>,
    pub gestures:     Vec<GestureEvent>,
}

impl HandFrame {
    /// Frame with a single hand and no gestures.
    pub fn single(sample: PoseSample) -> Self {
        HandFrame {
            timestamp_ms: sample.timestamp_ms,
            hands:        vec![sample],
            gestures:     Vec::new(),
        }
    }

    /// Frame with no hands in view.
    pub fn empty(timestamp_ms: i64) -> Self {
        HandFrame { timestamp_ms, ..HandFrame::default() }
    }

    pub fn with_gesture(mut self, event: GestureEvent) -> Self {
        self.gestures.push(event);
        self
    }

    pub fn primary_hand(&self) -> Option<&PoseSample> {
        self.hands.first()
    }

    pub fn has_tap(&self) -> bool {
        self.gestures.iter().any(|g| g.kind == GestureKind::Tap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_hand_is_first() {
        let a = PoseSample::new(Vector3::new(1.0, 0.0, 0.0), Vector3::ZERO, 0.0, 5);
        let b = PoseSample::new(Vector3::new(2.0, 0.0, 0.0), Vector3::ZERO, 0.0, 5);
        let frame = HandFrame { timestamp_ms: 5, hands: vec![a, b], gestures: vec![] };
        assert_eq!(frame.primary_hand(), Some(&a));
    }

    #[test]
    fn empty_frame_has_no_hand() {
        assert!(HandFrame::empty(10).primary_hand().is_none());
    }

    #[test]
    fn tap_detected_among_gestures() {
        let frame = HandFrame::empty(0).with_gesture(GestureEvent::tap(0));
        assert!(frame.has_tap());
        assert!(!HandFrame::empty(0).has_tap());
    }
}
