//! Sighting deduplication and rate limiting
//!
//! The raw scan stream repeats the same nearby identifier once per
//! advertisement cycle, many times per second. Per identifier the aggregator
//! keeps one open window: the first sighting opens it, later sightings within
//! it replace the latest signal sample, and when the window has run its
//! course a single [`AggregatedSighting`] carrying the freshest sample is
//! emitted. Windows roll over lazily on the next observation of the same
//! identifier, or in bulk via [`SightingAggregator::drain_expired`], which
//! the supervisor calls on every timer tick.
//!
//! The map is explicitly bounded: entries that have aged past the prune
//! horizon are dropped, so an identifier heard once cannot pin memory
//! forever.

use std::collections::HashMap;

use core::time::Duration;

use tracing::debug;

use crate::types::{AggregatedSighting, Identifier, Sighting, Timestamp};

// ----------------------------------------------------------------------------
// Pending Window
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct PendingWindow {
    opened_at: Timestamp,
    latest: Sighting,
    samples: u32,
}

impl PendingWindow {
    fn open(sighting: Sighting) -> Self {
        Self {
            opened_at: sighting.observed_at,
            latest: sighting,
            samples: 1,
        }
    }

    fn fold(&mut self, sighting: Sighting) {
        self.samples += 1;
        if sighting.observed_at >= self.latest.observed_at {
            self.latest = sighting;
        }
    }

    fn close(self) -> AggregatedSighting {
        AggregatedSighting {
            identifier: self.latest.identifier,
            rssi: self.latest.rssi,
            first_seen: self.opened_at,
            last_seen: self.latest.observed_at,
            samples: self.samples,
        }
    }
}

// ----------------------------------------------------------------------------
// Aggregator
// ----------------------------------------------------------------------------

/// Deduplicates and rate-limits the raw sighting stream
pub struct SightingAggregator {
    window: Duration,
    prune_windows: u32,
    pending: HashMap<Identifier, PendingWindow>,
}

impl SightingAggregator {
    /// Create an aggregator emitting at most one sighting per identifier
    /// per `window`; entries older than `prune_windows` windows are dropped.
    pub fn new(window: Duration, prune_windows: u32) -> Self {
        Self {
            window,
            prune_windows,
            pending: HashMap::new(),
        }
    }

    /// Fold a raw sighting into its identifier's window.
    ///
    /// Returns the previous window's aggregate when this observation rolls
    /// an elapsed window over; otherwise nothing is emitted yet.
    pub fn observe(&mut self, sighting: Sighting) -> Option<AggregatedSighting> {
        let now = sighting.observed_at;
        self.prune(now);

        let elapsed = self
            .pending
            .get(&sighting.identifier)
            .map(|open| now - open.opened_at >= self.window_millis());

        match elapsed {
            Some(true) => {
                let next = PendingWindow::open(sighting.clone());
                let closed = self.pending.insert(sighting.identifier, next);
                closed.map(PendingWindow::close)
            }
            Some(false) => {
                if let Some(open) = self.pending.get_mut(&sighting.identifier) {
                    open.fold(sighting);
                }
                None
            }
            None => {
                self.pending
                    .insert(sighting.identifier.clone(), PendingWindow::open(sighting));
                None
            }
        }
    }

    /// Emit every window that has been open for at least the configured
    /// interval. Called from the periodic ticks so an aggregate does not
    /// have to wait for the next observation of the same identifier.
    pub fn drain_expired(&mut self, now: Timestamp) -> Vec<AggregatedSighting> {
        self.prune(now);
        let window = self.window_millis();
        let expired: Vec<Identifier> = self
            .pending
            .iter()
            .filter(|(_, open)| now - open.opened_at >= window)
            .map(|(identifier, _)| identifier.clone())
            .collect();
        expired
            .into_iter()
            .filter_map(|identifier| self.pending.remove(&identifier))
            .map(PendingWindow::close)
            .collect()
    }

    /// Drop all pending windows without emitting
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of identifiers currently tracked
    pub fn tracked(&self) -> usize {
        self.pending.len()
    }

    // Entries past the horizon can only exist when the periodic drain has
    // stalled; dropping them bounds the map.
    fn prune(&mut self, now: Timestamp) {
        let horizon = self.window_millis() * u64::from(self.prune_windows);
        let before = self.pending.len();
        self.pending
            .retain(|_, open| now - open.opened_at <= horizon);
        let dropped = before - self.pending.len();
        if dropped > 0 {
            debug!(dropped, "pruned stale aggregation windows");
        }
    }

    fn window_millis(&self) -> u64 {
        self.window.as_millis() as u64
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
