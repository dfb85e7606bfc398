use crate::config::CrawlerConfig;
use std::time::{Duration, Instant};

/// Tracks pacing for one host during a crawl run
///
/// Requests to a host are spaced by a random delay; the next request may not
/// start before `next_allowed`. `in_flight` caps concurrent extractions
/// against the same host.
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// Extractions currently running against this host
    pub in_flight: u32,

    /// Number of requests dispatched to this host in the current run
    pub request_count: u32,

    /// Earliest instant the next request may start
    pub next_allowed: Option<Instant>,
}

impl HostState {
    /// Creates a new HostState with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether another extraction may be dispatched to this host
    pub fn can_dispatch(&self, config: &CrawlerConfig) -> bool {
        self.in_flight < config.max_concurrent_per_host
    }

    /// Reserves the next pacing slot for this host
    ///
    /// The slot is the later of `now` and the previous slot's end; the slot
    /// after this one starts `gap` later. Returns how long the caller must
    /// wait before issuing the request.
    pub fn reserve_slot(&mut self, now: Instant, gap: Duration) -> Duration {
        let slot = match self.next_allowed {
            Some(next) if next > now => next,
            _ => now,
        };

        self.next_allowed = Some(slot + gap);
        self.in_flight += 1;
        self.request_count += 1;

        slot.duration_since(now)
    }

    /// Releases an in-flight extraction once it has completed
    pub fn release(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }
}
