//! Global rate gate.
//!
//! Enforces a minimum spacing between request starts across all workers.
//! The check, the wait and the update of the last-start timestamp happen
//! under one mutex, so two workers can never both observe an expired
//! interval and start together.

use crate::clock::Clock;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// Process-wide spacing of request starts.
pub struct RateGate {
    min_interval: Duration,
    clock: Arc<dyn Clock>,
    last_start: Mutex<Option<Instant>>,
}

impl RateGate {
    /// Create a gate enforcing `min_interval` between acquisitions.
    pub fn new(min_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            min_interval,
            clock,
            last_start: Mutex::new(None),
        }
    }

    /// Configured spacing.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until a request may start, then record and return its start time.
    ///
    /// Callers are granted in lock order. The mutex is held while waiting,
    /// so the next caller measures its interval from the previous grant.
    pub fn acquire(&self) -> Instant {
        // A panic while holding the lock cannot leave the timestamp torn.
        let mut last_start = self
            .last_start
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut now = self.clock.now();
        if let Some(last) = *last_start {
            let next = last + self.min_interval;
            if now < next {
                let wait = next - now;
                debug!(wait_ms = wait.as_millis() as u64, "rate gate waiting");
                self.clock.sleep(wait);
                now = self.clock.now();
            }
        }

        *last_start = Some(now);
        now
    }
}
