//! Error types for the beacon core
//!
//! Synchronous preconditions (radio off, payload over budget, unassigned
//! identifier) are returned as [`BeaconError`] before any radio call is made.
//! Asynchronous radio outcomes are not errors in the `Result` sense; they
//! arrive as state transitions and events (see [`crate::events::BeaconEvent`]).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::RadioRole;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors surfaced by the beacon lifecycle core
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeaconError {
    /// Adapter absent or off, or the required feature is unsupported.
    /// Non-fatal: no state changes, and the next periodic tick retries.
    #[error("{role} radio unavailable: adapter off or feature unsupported")]
    RadioUnavailable { role: RadioRole },

    /// Encoded payload would exceed the advertisement byte budget.
    /// Encoding fails rather than silently truncating.
    #[error("payload too large: {size} bytes (max: {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The identifier source returned the unassigned sentinel; nothing
    /// may be broadcast until an identifier is configured.
    #[error("identifier is unassigned")]
    InvalidIdentifier,
}

pub type Result<T> = core::result::Result<T, BeaconError>;
