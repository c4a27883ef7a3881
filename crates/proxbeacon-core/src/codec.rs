//! Advertisement payload encoding and decoding
//!
//! The encoded payload is the service tag plus the raw identifier bytes; it
//! is the only wire format this core owns, and the de facto protocol between
//! two instances of the system. Encoding fails rather than truncating: a
//! truncated payload on the air is a silent correctness bug.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use uuid::Uuid;

use crate::error::{BeaconError, Result};
use crate::types::Identifier;

// ----------------------------------------------------------------------------
// Service Tag
// ----------------------------------------------------------------------------

/// Bluetooth SIG base UUID with the 16-bit alias field zeroed
const SIG_BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805F9B34FB;

/// Mask clearing the 16-bit alias field of a SIG base UUID
const SIG_ALIAS_MASK: u128 = 0xFFFF0000_FFFF_FFFF_FFFF_FFFFFFFFFFFF;

/// Service identifier tag distinguishing this system's advertisements from
/// general BLE traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceTag(Uuid);

impl ServiceTag {
    /// Create a tag from a full 128-bit UUID
    pub const fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Expand a Bluetooth SIG 16-bit alias into the 128-bit base UUID
    pub const fn from_u16(alias: u16) -> Self {
        Self(Uuid::from_u128(SIG_BASE_UUID | ((alias as u128) << 96)))
    }

    /// Get the underlying UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Bytes this tag occupies in the advertisement payload: 2 for a SIG
    /// 16-bit alias, 16 for a full 128-bit UUID.
    pub fn encoded_len(&self) -> usize {
        if self.0.as_u128() & SIG_ALIAS_MASK == SIG_BASE_UUID {
            2
        } else {
            16
        }
    }
}

// ----------------------------------------------------------------------------
// Payload and Report
// ----------------------------------------------------------------------------

/// Encoded bytes actually placed on the air: service tag plus identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisementPayload {
    tag: ServiceTag,
    data: SmallVec<[u8; 27]>,
}

impl AdvertisementPayload {
    /// The service tag the payload is filed under
    pub fn tag(&self) -> ServiceTag {
        self.tag
    }

    /// The identifier bytes carried as service data
    pub fn service_data(&self) -> &[u8] {
        &self.data
    }

    /// Total size on the air, tag included
    pub fn encoded_len(&self) -> usize {
        self.tag.encoded_len() + self.data.len()
    }
}

/// A received advertisement as reported by the scanning radio.
///
/// Mirrors the property set BLE central APIs expose per scan result; the host
/// glue fills in whatever fields the platform delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvertisementReport {
    /// Service data fields keyed by service UUID
    pub service_data: HashMap<Uuid, Vec<u8>>,
    /// Advertised device name, if any
    pub local_name: Option<String>,
    /// Received signal strength in dBm
    pub rssi: i16,
}

impl AdvertisementReport {
    pub fn new(rssi: i16) -> Self {
        Self {
            service_data: HashMap::new(),
            local_name: None,
            rssi,
        }
    }

    pub fn with_service_data(mut self, tag: ServiceTag, data: impl Into<Vec<u8>>) -> Self {
        self.service_data.insert(tag.uuid(), data.into());
        self
    }

    pub fn with_local_name(mut self, name: impl Into<String>) -> Self {
        self.local_name = Some(name.into());
        self
    }
}

// ----------------------------------------------------------------------------
// Codec
// ----------------------------------------------------------------------------

/// Encodes identifiers into bounded advertisement payloads and extracts
/// identifiers from received advertisements.
#[derive(Debug, Clone)]
pub struct PayloadCodec {
    tag: ServiceTag,
    budget: usize,
}

impl PayloadCodec {
    /// Create a codec for the given tag and byte budget (tag included)
    pub fn new(tag: ServiceTag, budget: usize) -> Self {
        Self { tag, budget }
    }

    /// The service tag advertisements are filed under and filtered on
    pub fn tag(&self) -> ServiceTag {
        self.tag
    }

    /// Encode an identifier into an advertisement payload.
    ///
    /// Rejects the unassigned sentinel and anything that would exceed the
    /// byte budget; both are checked before any radio call is attempted.
    pub fn encode(&self, identifier: &Identifier) -> Result<AdvertisementPayload> {
        if identifier.is_unassigned() {
            return Err(BeaconError::InvalidIdentifier);
        }
        let size = self.tag.encoded_len() + identifier.len();
        if size > self.budget {
            return Err(BeaconError::PayloadTooLarge {
                size,
                max: self.budget,
            });
        }
        Ok(AdvertisementPayload {
            tag: self.tag,
            data: SmallVec::from_slice(identifier.as_bytes()),
        })
    }

    /// Extract an identifier from a received advertisement.
    ///
    /// The service-data field for the expected tag wins; devices that cannot
    /// set custom service data advertise the identifier as their device name,
    /// so the name is the fallback. `None` means foreign or malformed
    /// traffic, which is expected noise and not an error.
    pub fn decode(&self, report: &AdvertisementReport) -> Option<Identifier> {
        if let Some(data) = report.service_data.get(&self.tag.uuid()) {
            if !data.is_empty() {
                return Some(Identifier::from_bytes(data));
            }
        }
        report
            .local_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(|name| Identifier::from_bytes(name.as_bytes()))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
