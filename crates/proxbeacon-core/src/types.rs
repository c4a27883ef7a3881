//! Core types for the proximity beacon
//!
//! This module defines the fundamental types used throughout the beacon
//! lifecycle, using newtype patterns for semantic validation and type safety.

use core::fmt;
use core::ops::{Add, Sub};
use core::time::Duration;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ----------------------------------------------------------------------------
// Identifier
// ----------------------------------------------------------------------------

/// Inline capacity for identifier storage; the 31-byte advertisement ceiling
/// leaves at most this much room once a service tag is included.
pub const MAX_IDENTIFIER_LEN: usize = 20;

/// Opaque rotating identifier broadcast by the local device.
///
/// An empty identifier is the "unassigned" sentinel: it is what an
/// [`crate::identity::IdentifierSource`] returns before a value has been
/// configured, and the payload codec rejects it so it can never reach the air.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier(SmallVec<[u8; MAX_IDENTIFIER_LEN]>);

impl Identifier {
    /// Create an identifier from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(SmallVec::from_slice(bytes))
    }

    /// The unassigned sentinel
    pub fn unassigned() -> Self {
        Self(SmallVec::new())
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the unassigned sentinel
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True for the unassigned sentinel
    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::from_bytes(value.as_bytes())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unassigned() {
            write!(f, "unassigned")
        } else {
            write!(f, "{}", hex::encode(&self.0))
        }
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self)
    }
}

// ----------------------------------------------------------------------------
// Timestamp
// ----------------------------------------------------------------------------

/// Millisecond timestamp since Unix epoch
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a new timestamp
    pub fn new(millis: u64) -> Self {
        Self(millis)
    }

    /// Get the current wall-clock timestamp
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(duration.as_millis() as u64)
    }

    /// Get the raw milliseconds
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Get duration since another timestamp (saturating)
    pub fn duration_since(&self, other: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(other.0))
    }
}

impl Add<u64> for Timestamp {
    type Output = Timestamp;

    fn add(self, millis: u64) -> Timestamp {
        Timestamp(self.0.saturating_add(millis))
    }
}

impl Sub for Timestamp {
    type Output = u64;

    fn sub(self, other: Timestamp) -> u64 {
        self.0.saturating_sub(other.0)
    }
}

// ----------------------------------------------------------------------------
// Time Source
// ----------------------------------------------------------------------------

/// Trait for providing timestamps
///
/// Every time-dependent component takes its clock through this trait so the
/// whole core can be driven with a manual clock in tests.
pub trait TimeSource {
    /// Get the current timestamp
    fn now(&self) -> Timestamp;
}

/// Wall-clock implementation of [`TimeSource`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl SystemTimeSource {
    pub fn new() -> Self {
        Self
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

// ----------------------------------------------------------------------------
// Session Epoch
// ----------------------------------------------------------------------------

/// Generation token distinguishing radio and timer sessions.
///
/// Every accepted start advances the epoch; radio completions and timer ticks
/// echo the epoch they were issued under, so a callback left over from a dead
/// session is recognized on delivery and discarded instead of acted on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct SessionEpoch(u64);

impl SessionEpoch {
    /// The epoch before any session has started
    pub fn initial() -> Self {
        Self(0)
    }

    /// Advance to the next generation and return it
    pub fn advance(&mut self) -> Self {
        self.0 += 1;
        *self
    }

    /// Get the raw value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ----------------------------------------------------------------------------
// Radio Error Code
// ----------------------------------------------------------------------------

/// Opaque error code reported by the radio on a failed start.
///
/// The core surfaces it as-is; interpreting it is the host's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RadioErrorCode(i32);

impl RadioErrorCode {
    pub fn new(code: i32) -> Self {
        Self(code)
    }

    pub fn code(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for RadioErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "radio error {}", self.0)
    }
}

/// Which radio capability a fault refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RadioRole {
    Advertiser,
    Scanner,
}

impl fmt::Display for RadioRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RadioRole::Advertiser => write!(f, "advertiser"),
            RadioRole::Scanner => write!(f, "scanner"),
        }
    }
}

// ----------------------------------------------------------------------------
// Sightings
// ----------------------------------------------------------------------------

/// A single observation of a nearby identifier while scanning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sighting {
    /// The identifier the nearby device advertised
    pub identifier: Identifier,
    /// Received signal strength in dBm
    pub rssi: i16,
    /// When the advertisement was observed
    pub observed_at: Timestamp,
}

/// A sighting that passed aggregation policy; this is what is surfaced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedSighting {
    /// The identifier the nearby device advertised
    pub identifier: Identifier,
    /// Most recent signal sample observed within the window, in dBm
    pub rssi: i16,
    /// When the aggregation window opened
    pub first_seen: Timestamp,
    /// When the latest folded sighting was observed
    pub last_seen: Timestamp,
    /// Raw sightings folded into this record
    pub samples: u32,
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
