//! Radio collaborator interfaces
//!
//! The core never touches a BLE stack directly. The host supplies these two
//! capabilities; start calls are fire-and-forget, and their asynchronous
//! outcomes come back through the supervisor entry points tagged with the
//! session epoch they were issued under. A completion echoing a stale epoch
//! is recognized and discarded, never acted on.

use crate::codec::{AdvertisementPayload, ServiceTag};
use crate::types::SessionEpoch;

// ----------------------------------------------------------------------------
// Advertiser
// ----------------------------------------------------------------------------

/// Advertising capability of the underlying radio
pub trait RadioAdvertiser: Send + Sync {
    /// Whether the adapter supports multiple advertisement at all
    fn is_supported(&self) -> bool;

    /// Whether the adapter is powered on
    fn is_powered_on(&self) -> bool;

    /// Begin advertising `payload`. The outcome must be delivered to
    /// `BeaconSupervisor::on_advertise_result` with the same `session`.
    fn start_advertising(&self, payload: &AdvertisementPayload, session: SessionEpoch);

    /// Tear down the active advertising session, if any
    fn stop_advertising(&self);
}

// ----------------------------------------------------------------------------
// Scanner
// ----------------------------------------------------------------------------

/// Scanning capability of the underlying radio
pub trait RadioScanner: Send + Sync {
    /// Whether the adapter is powered on
    fn is_powered_on(&self) -> bool;

    /// Begin scanning for advertisements carrying `filter`. Matching reports
    /// go to `BeaconSupervisor::on_advertisement`; failures to
    /// `BeaconSupervisor::on_scan_failed` with the same `session`.
    fn start_scanning(&self, filter: &ServiceTag, session: SessionEpoch);

    /// Tear down the active scan session, if any
    fn stop_scanning(&self);
}
