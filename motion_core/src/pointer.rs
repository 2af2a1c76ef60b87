//! Pointer variant: palm velocity → relative mouse deltas + button state.
//!
//! The receiving microcontroller is a HID mouse emulator that moves the
//! cursor by `right - left` and `down - up` per command, so each direction
//! gets its own non-negative field instead of a signed delta.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::debounce::DEFAULT_TAP_COOL_DOWN_MS;
use crate::pose::Vector3;
use crate::sink::Command;

// ════════════════════════════════════════════════════════════════════════════
// PointerConfig
// ════════════════════════════════════════════════════════════════════════════

/// Tuning for the pointer pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    /// Per-axis velocity (mm/s) at or below which the hand is considered
    /// still.
    pub dead_zone:        f32,
    /// mm/s of palm velocity per unit of cursor movement.
    pub rate_divisor:     i32,
    /// Grab strength above which the button is held.
    pub click_threshold:  f32,
    /// Movement commands are sent once this many have been suppressed.
    pub send_threshold:   u32,
    pub tap_cool_down_ms: i64,
    /// Gap between the press and release halves of a tap click.
    pub click_hold_ms:    i64,
}

impl Default for PointerConfig {
    fn default() -> Self {
        PointerConfig {
            dead_zone:        100.0,
            rate_divisor:     6,
            click_threshold:  0.5,
            send_threshold:   4,
            tap_cool_down_ms: DEFAULT_TAP_COOL_DOWN_MS,
            click_hold_ms:    100,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PointerCommand
// ════════════════════════════════════════════════════════════════════════════

/// One mouse report. Wire order: `up,down,right,left,click`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PointerCommand {
    pub up:    i32,
    pub down:  i32,
    pub right: i32,
    pub left:  i32,
    /// 1 = button held, 0 = released.
    pub click: u8,
}

impl PointerCommand {
    /// Button down with no movement.
    pub fn click_press() -> Self {
        PointerCommand { click: 1, ..PointerCommand::default() }
    }

    /// Button up with no movement.
    pub fn click_release() -> Self {
        PointerCommand::default()
    }
}

impl fmt::Display for PointerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{},{}", self.up, self.down, self.right, self.left, self.click)
    }
}

impl Command for PointerCommand {}

// ════════════════════════════════════════════════════════════════════════════
// PointerTransform
// ════════════════════════════════════════════════════════════════════════════

/// Stateless velocity → [`PointerCommand`] mapping.
#[derive(Clone, Debug)]
pub struct PointerTransform {
    dead_zone:       f32,
    rate_divisor:    i32,
    click_threshold: f32,
}

impl PointerTransform {
    pub fn new(cfg: &PointerConfig) -> Self {
        PointerTransform {
            dead_zone:       cfg.dead_zone,
            rate_divisor:    cfg.rate_divisor.max(1),
            click_threshold: cfg.click_threshold,
        }
    }

    /// `None` while both x and y velocity sit inside the dead zone; z is
    /// never looked at.
    pub fn transform(&self, velocity: Vector3, grab_strength: f32) -> Option<PointerCommand> {
        let (vx, vy) = (velocity.x, velocity.y);
        if vx.abs() <= self.dead_zone && vy.abs() <= self.dead_zone {
            return None;
        }

        // Sensor +x is to the user's right, but the phone sits facing the
        // user, so hand-right moves the cursor left.
        let (left, right) = self.split_axis(vx);
        let (up, down)    = self.split_axis(vy);
        let click = u8::from(grab_strength > self.click_threshold);

        Some(PointerCommand { up, down, right, left, click })
    }

    /// Split a signed velocity into (positive-direction, negative-direction)
    /// magnitudes. Velocities inside the dead zone contribute nothing;
    /// magnitudes beyond `i32` saturate.
    fn split_axis(&self, v: f32) -> (i32, i32) {
        if v > self.dead_zone {
            (v as i32 / self.rate_divisor, 0)
        } else if v < -self.dead_zone {
            (0, (-v) as i32 / self.rate_divisor)
        } else {
            (0, 0)
        }
    }
}

impl Default for PointerTransform {
    fn default() -> Self {
        PointerTransform::new(&PointerConfig::default())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> Vector3 { Vector3::new(x, y, 0.0) }

    // ── dead zone ────────────────────────────────────────────────────────
    #[test]
    fn dead_zone_is_inclusive() {
        let t = PointerTransform::default();
        for &(x, y) in &[(0.0, 0.0), (100.0, -100.0), (-100.0, 50.0), (99.9, 100.0)] {
            assert_eq!(t.transform(v(x, y), 0.0), None, "({}, {})", x, y);
        }
    }

    #[test]
    fn z_velocity_ignored() {
        let t = PointerTransform::default();
        assert_eq!(t.transform(Vector3::new(0.0, 0.0, 900.0), 1.0), None);
    }

    // ── axis mapping ─────────────────────────────────────────────────────
    #[test]
    fn positive_x_moves_left() {
        let t = PointerTransform::default();
        let cmd = t.transform(v(150.0, 0.0), 0.0).unwrap();
        assert_eq!(cmd, PointerCommand { up: 0, down: 0, right: 0, left: 25, click: 0 });
    }

    #[test]
    fn negative_x_moves_right() {
        let t = PointerTransform::default();
        let cmd = t.transform(v(-131.0, 0.0), 0.0).unwrap();
        assert_eq!(cmd.right, 21);
        assert_eq!(cmd.left, 0);
    }

    #[test]
    fn y_axis_splits_up_down() {
        let t = PointerTransform::default();
        assert_eq!(t.transform(v(0.0, 600.0), 0.0).unwrap().up, 100);
        let down = t.transform(v(0.0, -605.9), 0.0).unwrap();
        assert_eq!((down.up, down.down), (0, 100));
    }

    #[test]
    fn one_axis_past_dead_zone_other_axis_zero() {
        let t = PointerTransform::default();
        let cmd = t.transform(v(90.0, 300.0), 0.0).unwrap();
        assert_eq!((cmd.left, cmd.right, cmd.up), (0, 0, 50));
    }

    #[test]
    fn fractional_velocity_truncates() {
        let t = PointerTransform::default();
        // 100.5 → 100 → 16
        assert_eq!(t.transform(v(100.5, 0.0), 0.0).unwrap().left, 16);
    }

    #[test]
    fn extreme_velocities_saturate() {
        let t = PointerTransform::default();
        let right = t.transform(v(-3.0e9, f32::MIN), 0.0).unwrap();
        assert_eq!(right.right, i32::MAX / 6);
        assert_eq!(right.down, i32::MAX / 6);
        let left = t.transform(v(f32::MAX, 0.0), 0.0).unwrap();
        assert_eq!(left.left, i32::MAX / 6);
    }

    // ── click ────────────────────────────────────────────────────────────
    #[test]
    fn click_follows_grab_strictly_above_half() {
        let t = PointerTransform::default();
        assert_eq!(t.transform(v(200.0, 0.0), 0.5).unwrap().click, 0);
        assert_eq!(t.transform(v(200.0, 0.0), 0.51).unwrap().click, 1);
    }

    // ── wire format ──────────────────────────────────────────────────────
    #[test]
    fn wire_order_is_up_down_right_left_click() {
        let cmd = PointerCommand { up: 1, down: 2, right: 3, left: 4, click: 1 };
        assert_eq!(cmd.to_string(), "1,2,3,4,1");
        assert_eq!(PointerCommand::click_press().to_string(), "0,0,0,0,1");
        assert_eq!(PointerCommand::click_release().to_string(), "0,0,0,0,0");
    }
}
