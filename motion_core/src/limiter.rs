//! Send-rate throttling.
//!
//! The sensor produces 100+ frames per second; the serial link and the
//! actuator firmware comfortably handle a small fraction of that. Sending
//! every frame saturates the link and makes the servos oscillate, so all
//! but every Nth command is dropped. Later commands supersede earlier ones
//! (each carries the full target state), so nothing is lost by dropping.

/// Frame-counting coalescer: passes one command after `threshold` have
/// been suppressed.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    threshold: u32,
    count:     u32,
}

impl RateLimiter {
    pub fn new(threshold: u32) -> Self {
        RateLimiter { threshold, count: 0 }
    }

    /// Offer a freshly transformed command.
    ///
    /// * `None` (dead-zone frame) leaves the counter alone.
    /// * `force` sends immediately without touching the counter.
    /// * Otherwise the counter advances and the command is released only
    ///   once the counter exceeds the threshold, which resets it.
    pub fn offer<C>(&mut self, cmd: Option<C>, force: bool) -> Option<C> {
        let cmd = cmd?;
        if force {
            return Some(cmd);
        }
        self.count += 1;
        if self.count > self.threshold {
            self.count = 0;
            Some(cmd)
        } else {
            None
        }
    }

    /// Forget partially accumulated frames.
    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self)     -> u32 { self.count }
    pub fn threshold(&self) -> u32 { self.threshold }
}
