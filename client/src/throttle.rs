//! Outbound update rate limiting

use std::time::{Duration, Instant};

/// Decides whether the current tick may emit a state update.
///
/// Skipped ticks are simply lost: there is no queue and no catch-up burst, only the
/// state at the next permitted tick goes out.
#[derive(Debug, Clone)]
pub struct UpdateThrottler {
    interval: Duration,
    last_emit: Option<Instant>,
}

impl UpdateThrottler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
        }
    }

    /// Returns true and records `now` when at least one interval has passed since the
    /// last emission, or when nothing has been emitted yet
    pub fn poll(&mut self, now: Instant) -> bool {
        let due = match self.last_emit {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        };
        if due {
            self.last_emit = Some(now);
        }
        due
    }

    /// Forgets the last emission so the next poll fires immediately
    pub fn reset(&mut self) {
        self.last_emit = None;
    }
}
