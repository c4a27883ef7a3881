//! Beacon lifecycle configuration

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::ServiceTag;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Advertisement payload ceiling imposed by the BLE legacy advertising PDU;
/// the 31 bytes are shared by every field in the packet, service tag included.
pub const DEFAULT_ADVERTISEMENT_BUDGET: usize = 31;

/// Configuration for the beacon lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeaconConfig {
    /// How often the advertised identifier is rotated (stop + start)
    pub advertise_refresh_interval: Duration,
    /// How long each scan session stays open before cooling down
    pub scan_session_duration: Duration,
    /// How often a cooled-down (or failed) scan session is resumed
    pub scan_rescan_interval: Duration,
    /// Minimum interval between aggregated sightings of one identifier
    pub aggregation_window: Duration,
    /// Aggregator entries older than this many windows are dropped
    pub prune_windows: u32,
    /// Service tag advertised and filtered on
    pub service_tag: ServiceTag,
    /// Advertisement byte budget, service tag included
    pub advertisement_budget: usize,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            advertise_refresh_interval: Duration::from_secs(300),
            scan_session_duration: Duration::from_secs(10),
            scan_rescan_interval: Duration::from_secs(60),
            // Matches the refresh interval: one aggregated sighting per
            // identifier per rotation period.
            aggregation_window: Duration::from_secs(300),
            prune_windows: 4,
            service_tag: ServiceTag::from_u16(0xFD6F),
            advertisement_budget: DEFAULT_ADVERTISEMENT_BUDGET,
        }
    }
}

impl BeaconConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the advertise refresh interval
    pub fn with_advertise_refresh_interval(mut self, interval: Duration) -> Self {
        self.advertise_refresh_interval = interval;
        self
    }

    /// Set the scan session duration
    pub fn with_scan_session_duration(mut self, duration: Duration) -> Self {
        self.scan_session_duration = duration;
        self
    }

    /// Set the scan rescan interval
    pub fn with_scan_rescan_interval(mut self, interval: Duration) -> Self {
        self.scan_rescan_interval = interval;
        self
    }

    /// Set the aggregation window
    pub fn with_aggregation_window(mut self, window: Duration) -> Self {
        self.aggregation_window = window;
        self
    }

    /// Set how many windows an aggregator entry may age before pruning
    pub fn with_prune_windows(mut self, windows: u32) -> Self {
        self.prune_windows = windows;
        self
    }

    /// Set the service tag
    pub fn with_service_tag(mut self, tag: ServiceTag) -> Self {
        self.service_tag = tag;
        self
    }

    /// Set the advertisement byte budget
    pub fn with_advertisement_budget(mut self, budget: usize) -> Self {
        self.advertisement_budget = budget;
        self
    }
}
