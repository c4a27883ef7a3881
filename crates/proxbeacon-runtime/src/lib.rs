//! Tokio driver for the proximity beacon lifecycle core
//!
//! `proxbeacon-core` is a passive state machine: it decides what should
//! happen but owns no timers and no threads. This crate supplies the
//! missing pieces — tokio timers delivering epoch-tagged ticks, a mutex
//! serializing every lifecycle call, and an event channel — so a host only
//! has to implement the two radio traits and relay callbacks.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use proxbeacon_core::{
//!     AdvertisementPayload, BeaconConfig, Identifier, RadioAdvertiser, RadioScanner,
//!     ServiceTag, SessionEpoch, SharedIdentifierSource,
//! };
//! use proxbeacon_runtime::BeaconRuntimeBuilder;
//!
//! struct PlatformAdvertiser;
//!
//! impl RadioAdvertiser for PlatformAdvertiser {
//!     fn is_supported(&self) -> bool { true }
//!     fn is_powered_on(&self) -> bool { true }
//!     fn start_advertising(&self, _payload: &AdvertisementPayload, _session: SessionEpoch) {
//!         // hand the payload to the platform BLE stack
//!     }
//!     fn stop_advertising(&self) {}
//! }
//!
//! struct PlatformScanner;
//!
//! impl RadioScanner for PlatformScanner {
//!     fn is_powered_on(&self) -> bool { true }
//!     fn start_scanning(&self, _filter: &ServiceTag, _session: SessionEpoch) {}
//!     fn stop_scanning(&self) {}
//! }
//!
//! # async fn example() {
//! let source = Arc::new(SharedIdentifierSource::new());
//! source.set(Identifier::from_bytes(b"user-4711"));
//!
//! let (runtime, mut events) = BeaconRuntimeBuilder::new(
//!     Arc::new(PlatformAdvertiser),
//!     Arc::new(PlatformScanner),
//!     source,
//! )
//! .with_config(BeaconConfig::default())
//! .build();
//!
//! runtime.start().await;
//! while let Some(event) = events.recv().await {
//!     println!("beacon event: {event:?}");
//! }
//! # }
//! ```

mod runtime;
mod scheduler;

// Public API exports
pub use runtime::{BeaconRuntime, BeaconRuntimeBuilder};
pub use scheduler::TokioScheduler;

// Re-export the core surface hosts need to wire radios and consume events
pub use proxbeacon_core::{
    AdvertisementPayload, AdvertisementReport, BeaconConfig, BeaconError, BeaconEvent,
    IdentifierSource, RadioAdvertiser, RadioErrorCode, RadioScanner, ServiceTag, SessionEpoch,
    SharedIdentifierSource,
};
