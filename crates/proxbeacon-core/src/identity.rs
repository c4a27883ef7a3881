//! Local identifier supply and rotation

use std::sync::{RwLock, RwLockWriteGuard};

use crate::types::{Identifier, SystemTimeSource, TimeSource, Timestamp};

// ----------------------------------------------------------------------------
// Identifier Source
// ----------------------------------------------------------------------------

/// Supplies the identifier to advertise.
///
/// `current()` is a deterministic snapshot with no observable side effects;
/// the controllers call it on every (re)start, so it must be cheap at
/// arbitrary frequency. A source with nothing configured returns the
/// unassigned sentinel, which the codec refuses to put on the air.
pub trait IdentifierSource: Send + Sync {
    /// Snapshot of the identifier to advertise right now
    fn current(&self) -> Identifier;
}

// ----------------------------------------------------------------------------
// Shared Source
// ----------------------------------------------------------------------------

struct Slot {
    identifier: Identifier,
    expires_at: Option<Timestamp>,
}

/// Host-updatable identifier slot with an optional validity window.
///
/// Rotation needs no coordination with the controllers: the next refresh
/// re-fetches and re-encodes whatever is current. Once the validity window
/// passes, `current()` degrades to the unassigned sentinel so an expired
/// identifier can never be broadcast.
pub struct SharedIdentifierSource<C: TimeSource = SystemTimeSource> {
    slot: RwLock<Slot>,
    clock: C,
}

impl SharedIdentifierSource<SystemTimeSource> {
    /// Create an empty source on the wall clock
    pub fn new() -> Self {
        Self::with_clock(SystemTimeSource)
    }

    /// Create a source pre-loaded with an identifier
    pub fn with_identifier(identifier: Identifier) -> Self {
        let source = Self::new();
        source.set(identifier);
        source
    }
}

impl Default for SharedIdentifierSource<SystemTimeSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TimeSource> SharedIdentifierSource<C> {
    /// Create an empty source on a custom clock
    pub fn with_clock(clock: C) -> Self {
        Self {
            slot: RwLock::new(Slot {
                identifier: Identifier::unassigned(),
                expires_at: None,
            }),
            clock,
        }
    }

    /// Install a new identifier with no expiry
    pub fn set(&self, identifier: Identifier) {
        let mut slot = self.slot_write();
        slot.identifier = identifier;
        slot.expires_at = None;
    }

    /// Install a new identifier valid until `expires_at`
    pub fn set_with_validity(&self, identifier: Identifier, expires_at: Timestamp) {
        let mut slot = self.slot_write();
        slot.identifier = identifier;
        slot.expires_at = Some(expires_at);
    }

    /// Drop the current identifier
    pub fn clear(&self) {
        self.set(Identifier::unassigned());
    }

    fn slot_write(&self) -> RwLockWriteGuard<'_, Slot> {
        match self.slot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<C: TimeSource + Send + Sync> IdentifierSource for SharedIdentifierSource<C> {
    fn current(&self) -> Identifier {
        let slot = match self.slot.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(expiry) = slot.expires_at {
            if self.clock.now() >= expiry {
                return Identifier::unassigned();
            }
        }
        slot.identifier.clone()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
