use std::time::Duration;
use tokio::time::Instant;

/// Tracks request timing for one host
///
/// Used by the politeness throttle to space out consecutive fetches to the
/// same host. `next_slot` is a reservation: it may lie in the future while a
/// caller is still waiting for its turn.
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// Number of fetches started against this host
    pub request_count: u32,

    /// Start time reserved for the most recent fetch
    pub next_slot: Option<Instant>,
}

impl HostState {
    /// Creates a new HostState with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, delay: Duration, now: Instant) -> Option<Duration> {
        let ready_at = self.next_slot? + delay;
        if ready_at > now {
            Some(ready_at - now)
        } else {
            None
        }
    }

    /// Reserves the earliest permitted start time and returns it
    pub fn reserve_slot(&mut self, delay: Duration, now: Instant) -> Instant {
        let slot = match self.time_until_next_request(delay, now) {
            Some(wait) => now + wait,
            None => now,
        };
        self.next_slot = Some(slot);
        self.request_count += 1;
        slot
    }
}
