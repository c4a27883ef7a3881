//! Observer events
//!
//! Everything the core reports upward goes through one sink: aggregated
//! sightings, advertise/scan state transitions, and faults. How the host
//! relays them (direct call, queue, OS broadcast) is not the core's business.

use serde::{Deserialize, Serialize};

use crate::advertise::AdvertiseState;
use crate::error::BeaconError;
use crate::scan::ScanState;
use crate::types::{AggregatedSighting, RadioErrorCode};

// ----------------------------------------------------------------------------
// Events
// ----------------------------------------------------------------------------

/// Events surfaced by the beacon core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BeaconEvent {
    /// The advertising lifecycle changed state
    AdvertiseStateChanged(AdvertiseState),
    /// The scanning lifecycle changed state
    ScanStateChanged(ScanState),
    /// A nearby identifier passed aggregation policy
    Sighting(AggregatedSighting),
    /// The radio reported a scan failure; the scanner is back in Idle
    ScanFailed(RadioErrorCode),
    /// A lifecycle operation was rejected before reaching the radio
    Fault(BeaconError),
}

// ----------------------------------------------------------------------------
// Sink
// ----------------------------------------------------------------------------

/// Receives core events for relay to the host
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BeaconEvent);
}

impl<F> EventSink for F
where
    F: Fn(BeaconEvent) + Send + Sync,
{
    fn emit(&self, event: BeaconEvent) {
        self(event)
    }
}
