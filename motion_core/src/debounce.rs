//! Tap debouncing.
//!
//! The sensor reports a key-tap for several consecutive frames while the
//! finger is still moving, and users often double-poke. Only the first tap
//! in each cool-down window is allowed through.

use crate::pose::{GestureEvent, GestureKind};

pub const DEFAULT_TAP_COOL_DOWN_MS: i64 = 500;

/// Suppresses repeated taps inside a cool-down window.
#[derive(Clone, Debug)]
pub struct TapDebouncer {
    cool_down_ms: i64,
    last_fire_ms: Option<i64>,
}

impl TapDebouncer {
    pub fn new(cool_down_ms: i64) -> Self {
        TapDebouncer { cool_down_ms, last_fire_ms: None }
    }

    /// Starts as if a tap had already fired at `last_fire_ms`.
    pub fn with_last_fire(cool_down_ms: i64, last_fire_ms: i64) -> Self {
        TapDebouncer { cool_down_ms, last_fire_ms: Some(last_fire_ms) }
    }

    /// True iff `events` contains a tap and more than the cool-down has
    /// elapsed since the last fire. A gap of exactly `cool_down_ms` does not
    /// fire.
    pub fn should_fire(&mut self, events: &[GestureEvent], now_ms: i64) -> bool {
        if !events.iter().any(|e| e.kind == GestureKind::Tap) {
            return false;
        }
        let ready = match self.last_fire_ms {
            None       => true,
            Some(last) => now_ms - last > self.cool_down_ms,
        };
        if ready {
            self.last_fire_ms = Some(now_ms);
        }
        ready
    }

    pub fn last_fire_ms(&self) -> Option<i64> { self.last_fire_ms }
    pub fn cool_down_ms(&self) -> i64         { self.cool_down_ms }
}

impl Default for TapDebouncer {
    fn default() -> Self {
        TapDebouncer::new(DEFAULT_TAP_COOL_DOWN_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taps(t: i64) -> Vec<GestureEvent> {
        vec![GestureEvent::tap(t)]
    }

    #[test]
    fn no_tap_never_fires() {
        let mut d = TapDebouncer::default();
        assert!(!d.should_fire(&[], 10_000));
        assert_eq!(d.last_fire_ms(), None);
    }

    #[test]
    fn second_tap_inside_window_suppressed() {
        let mut d = TapDebouncer::default();
        assert!( d.should_fire(&taps(0),   0));
        assert!(!d.should_fire(&taps(400), 400));
        assert!( d.should_fire(&taps(900), 900));
    }

    #[test]
    fn exact_cool_down_does_not_fire() {
        let mut d = TapDebouncer::default();
        assert!( d.should_fire(&taps(0), 0));
        assert!(!d.should_fire(&taps(500), 500));
        assert!( d.should_fire(&taps(501), 501));
    }

    #[test]
    fn suppressed_tap_does_not_extend_window() {
        let mut d = TapDebouncer::default();
        d.should_fire(&taps(0), 0);
        d.should_fire(&taps(450), 450);
        // Window still measured from t=0.
        assert!(d.should_fire(&taps(501), 501));
    }

    #[test]
    fn earlier_fire_outside_window() {
        let mut d = TapDebouncer::with_last_fire(500, -600);
        assert!(d.should_fire(&taps(0), 0));
        assert_eq!(d.last_fire_ms(), Some(0));
    }
}
