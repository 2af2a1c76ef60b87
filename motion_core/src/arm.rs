//! Arm variant: palm position + grab → absolute servo angles for a
//! four-servo desk arm (claw, base swivel, shoulder, elbow).
//!
//! ```text
//!  sensor space (mm)            servo space (degrees)
//!  x  -90 ..  90   ── invert ──▶  base        0 .. 180
//!  y   80 .. 170   ────────────▶  vertical   30 .. 120
//!  z  -30 ..  30   ── invert ──▶  front_back  0 ..  60
//!  grab 0.0 .. 1.0 ────────────▶  grab        5 ..  55
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pose::Vector3;
use crate::sink::Command;

// ════════════════════════════════════════════════════════════════════════════
// ArmConfig
// ════════════════════════════════════════════════════════════════════════════

/// Tuning for the arm pipeline.
///
/// The ranges describe the slice of the sensor's field of view that maps
/// onto the arm's reach; the offsets shift the (inverted) clamped values
/// into servo angles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    /// A frame whose movement magnitude is at or below this on every axis
    /// produces no command.
    pub motion_threshold:  f32,
    pub send_threshold:    u32,
    pub x_range:           [i32; 2],
    pub y_range:           [i32; 2],
    pub z_range:           [i32; 2],
    pub base_offset:       i32,
    pub vertical_offset:   i32,
    pub front_back_offset: i32,
}

impl Default for ArmConfig {
    fn default() -> Self {
        ArmConfig {
            motion_threshold:  0.0,
            send_threshold:    20,
            x_range:           [-90, 90],
            y_range:           [80, 170],
            z_range:           [-30, 30],
            base_offset:       90,
            vertical_offset:   -50,
            front_back_offset: 30,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ArmCommand
// ════════════════════════════════════════════════════════════════════════════

/// Target angles for all four servos. Wire order: `grab,base,vertical,frontBack`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ArmCommand {
    pub grab:       i32,
    pub base:       i32,
    pub vertical:   i32,
    pub front_back: i32,
}

impl fmt::Display for ArmCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.grab, self.base, self.vertical, self.front_back)
    }
}

impl Command for ArmCommand {}

/// Claw opening for a grab strength: 0.0 → 5, 1.0 → 55.
///
/// Out-of-range strengths saturate so the claw servo never leaves its
/// mechanical limits.
pub fn scale_grab(grab_strength: f32) -> i32 {
    let g = grab_strength.clamp(0.0, 1.0);
    (g * 100.0) as i32 / 2 + 5
}

// ════════════════════════════════════════════════════════════════════════════
// ArmTransform
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct ArmTransform {
    cfg: ArmConfig,
}

impl ArmTransform {
    /// Ranges given high-to-low are reordered.
    pub fn new(cfg: &ArmConfig) -> Self {
        let mut cfg = cfg.clone();
        cfg.x_range = ordered(cfg.x_range);
        cfg.y_range = ordered(cfg.y_range);
        cfg.z_range = ordered(cfg.z_range);
        ArmTransform { cfg }
    }

    /// Map the palm `position` to servo angles. `movement` only gates
    /// whether anything is produced; `grab` is passed through (see
    /// [`scale_grab`]).
    pub fn transform(&self, movement: Vector3, position: Vector3, grab: i32) -> Option<ArmCommand> {
        let t = self.cfg.motion_threshold;
        if movement.x.abs() <= t && movement.y.abs() <= t && movement.z.abs() <= t {
            return None;
        }

        // Base and elbow servos are mounted mirrored relative to the sensor
        // axes.
        let x = -clamp_axis(position.x, self.cfg.x_range);
        let y =  clamp_axis(position.y, self.cfg.y_range);
        let z = -clamp_axis(position.z, self.cfg.z_range);

        Some(ArmCommand {
            grab,
            base:       x + self.cfg.base_offset,
            vertical:   y + self.cfg.vertical_offset,
            front_back: z + self.cfg.front_back_offset,
        })
    }

    pub fn config(&self) -> &ArmConfig { &self.cfg }
}

impl Default for ArmTransform {
    fn default() -> Self {
        ArmTransform::new(&ArmConfig::default())
    }
}

fn ordered([a, b]: [i32; 2]) -> [i32; 2] {
    [a.min(b), a.max(b)]
}

/// Truncate to whole millimetres, then saturate into `[lo, hi]`.
fn clamp_axis(v: f32, [lo, hi]: [i32; 2]) -> i32 {
    (v as i32).clamp(lo, hi)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
