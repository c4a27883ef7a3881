//! Proximity beacon lifecycle core
//!
//! Platform-agnostic controller for BLE proximity beaconing: decides when to
//! advertise, when to scan, how to rotate identifiers inside the 31-byte
//! advertisement budget, how to deduplicate sightings of nearby devices, and
//! how to recover from radio failures without leaking duplicate sessions.
//!
//! ## Architecture
//!
//! - [`identity`] - local identifier supply and rotation
//! - [`codec`] - advertisement payload encoding and decoding
//! - [`advertise`] - advertising lifecycle state machine
//! - [`scan`] - duty-cycled scanning state machine
//! - [`aggregator`] - sighting deduplication and rate limiting
//! - [`supervisor`] - top-level orchestration and timer plumbing
//! - [`radio`] - the interfaces the host's BLE glue implements
//!
//! All radio and timer I/O happens behind traits; completions and timer
//! ticks carry [`types::SessionEpoch`] tokens so anything left over from a
//! previous session is discarded on delivery instead of acted on. The
//! companion `proxbeacon-runtime` crate drives this core with tokio timers.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod advertise;
pub mod aggregator;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod radio;
pub mod scan;
pub mod supervisor;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use advertise::{AdvertiseController, AdvertiseState};
pub use aggregator::SightingAggregator;
pub use codec::{AdvertisementPayload, AdvertisementReport, PayloadCodec, ServiceTag};
pub use config::{BeaconConfig, DEFAULT_ADVERTISEMENT_BUDGET};
pub use error::{BeaconError, Result};
pub use events::{BeaconEvent, EventSink};
pub use identity::{IdentifierSource, SharedIdentifierSource};
pub use radio::{RadioAdvertiser, RadioScanner};
pub use scan::{ScanController, ScanState};
pub use supervisor::{BeaconSupervisor, Scheduler, SupervisorState, TickKind, TimerTick};
pub use types::{
    AggregatedSighting, Identifier, RadioErrorCode, RadioRole, SessionEpoch, Sighting,
    SystemTimeSource, TimeSource, Timestamp,
};
