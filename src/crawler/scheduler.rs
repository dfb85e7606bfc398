//! Scheduler for managing the crawl frontier and host pacing
//!
//! This module handles:
//! - FIFO queue management for URLs to crawl
//! - Global concurrency limiting (max extractions in flight)
//! - Per-host concurrency limiting and randomized request spacing
//!
//! The frontier is split into one FIFO queue per host. A second FIFO holds
//! the hosts that have queued work and a free per-host slot, so a saturated
//! host is never scanned: it rejoins the rotation when one of its extractions
//! completes.

use crate::config::CrawlerConfig;
use crate::state::HostState;
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use url::Url;

/// A URL queued for extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    /// The normalized URL to extract
    pub url: Url,

    /// Pacing key: the lowercase host of `url`
    pub host: String,
}

/// A URL released for extraction, with the time to wait for its pacing slot
#[derive(Debug, Clone)]
pub struct ScheduledFetch {
    pub url: QueuedUrl,
    pub wait: Duration,
}

/// Scheduler manages the frontier queue and host pacing
///
/// The scheduler coordinates:
/// - Global concurrency limits (max extractions in flight)
/// - Per-host concurrency limits
/// - Per-host request spacing (random delay between `min-delay-ms` and `max-delay-ms`)
/// - FIFO selection from the frontier, skipping saturated hosts
pub struct Scheduler {
    /// Per-host state tracking
    host_states: HashMap<String, HostState>,

    /// Queued URLs per host, oldest first
    queues: HashMap<String, VecDeque<QueuedUrl>>,

    /// Hosts with queued URLs and a free slot, in the order they became ready
    ///
    /// A host appears here at most once.
    ready: VecDeque<String>,

    /// Total URLs across all host queues
    queued: usize,

    /// Extractions dispatched and not yet completed
    in_flight: usize,

    /// Crawler configuration
    config: CrawlerConfig,
}

impl Scheduler {
    /// Creates a new scheduler with an empty frontier
    pub fn new(config: CrawlerConfig) -> Self {
        Self {
            host_states: HashMap::new(),
            queues: HashMap::new(),
            ready: VecDeque::new(),
            queued: 0,
            in_flight: 0,
            config,
        }
    }

    /// Adds a URL to the back of its host's queue
    pub fn add_to_frontier(&mut self, url: QueuedUrl) {
        let can_dispatch = self
            .host_states
            .entry(url.host.clone())
            .or_insert_with(HostState::new)
            .can_dispatch(&self.config);

        let queue = self.queues.entry(url.host.clone()).or_default();
        let was_empty = queue.is_empty();
        let host = url.host.clone();
        queue.push_back(url);
        self.queued += 1;

        // A host with capacity and earlier work is already in `ready`
        if was_empty && can_dispatch {
            self.ready.push_back(host);
        }
    }

    /// Takes the next dispatchable URL, if any
    ///
    /// Returns None when the global cap is reached or every queued URL
    /// belongs to a host that is already at its per-host cap.
    ///
    /// The returned fetch has already reserved its host's next pacing slot;
    /// the caller must report completion through [`Scheduler::complete`].
    pub fn next_dispatch(&mut self, now: Instant) -> Option<ScheduledFetch> {
        if self.in_flight >= self.config.max_concurrent_extractions as usize {
            return None;
        }

        let host = self.ready.pop_front()?;
        let queue = self.queues.get_mut(&host)?;
        let queued = queue.pop_front()?;
        let more_queued = !queue.is_empty();
        if !more_queued {
            self.queues.remove(&host);
        }
        self.queued -= 1;

        let gap = self.pacing_gap();
        let state = self.host_states.entry(host.clone()).or_insert_with(HostState::new);
        let wait = state.reserve_slot(now, gap);

        if more_queued && state.can_dispatch(&self.config) {
            self.ready.push_back(host);
        } else if more_queued {
            tracing::trace!("Host {} saturated, deferring its queue", host);
        }

        self.in_flight += 1;
        tracing::debug!("Dispatching {} (wait {:?})", queued.url, wait);

        Some(ScheduledFetch { url: queued, wait })
    }

    /// Records that an extraction against `host` has completed
    pub fn complete(&mut self, host: &str) {
        if let Some(state) = self.host_states.get_mut(host) {
            let was_saturated = !state.can_dispatch(&self.config);
            state.release();

            let has_queued = self.queues.get(host).is_some_and(|queue| !queue.is_empty());
            if was_saturated && has_queued && state.can_dispatch(&self.config) {
                self.ready.push_back(host.to_string());
            }
        }
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Draws the spacing before the following request to the same host
    fn pacing_gap(&self) -> Duration {
        let min = self.config.min_delay_ms;
        let max = self.config.max_delay_ms.max(min);
        Duration::from_millis(rand::rng().random_range(min..=max))
    }

    /// Returns the number of URLs in the frontier
    pub fn frontier_size(&self) -> usize {
        self.queued
    }

    /// Returns whether the frontier is empty
    pub fn is_empty(&self) -> bool {
        self.queued == 0
    }

    /// Returns the number of extractions in flight
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}
