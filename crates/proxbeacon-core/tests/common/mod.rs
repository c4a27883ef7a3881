//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use proxbeacon_core::{
    AdvertisementPayload, AggregatedSighting, BeaconEvent, EventSink, Identifier,
    IdentifierSource, RadioAdvertiser, RadioScanner, Scheduler, ServiceTag, SessionEpoch,
    TimeSource, TimerTick, Timestamp,
};
use uuid::Uuid;

/// Full 128-bit tag used across the suites (16 encoded bytes)
pub const TEST_TAG: ServiceTag =
    ServiceTag::new(Uuid::from_u128(0x6E40A001_B5A3_F393_E0A9_E50E24DCCA9E));

// ----------------------------------------------------------------------------
// Clock
// ----------------------------------------------------------------------------

/// Clock advanced by hand from the test body
#[derive(Clone, Default)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self(Arc::new(AtomicU64::new(start_ms)))
    }

    pub fn advance(&self, by: Duration) {
        self.0.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, millis: u64) {
        self.0.store(millis, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.0.load(Ordering::SeqCst))
    }
}

// ----------------------------------------------------------------------------
// Radios
// ----------------------------------------------------------------------------

pub struct MockAdvertiser {
    pub powered: AtomicBool,
    pub supported: AtomicBool,
    pub starts: Mutex<Vec<(AdvertisementPayload, SessionEpoch)>>,
    pub stops: AtomicUsize,
}

impl MockAdvertiser {
    pub fn online() -> Arc<Self> {
        Arc::new(Self {
            powered: AtomicBool::new(true),
            supported: AtomicBool::new(true),
            starts: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
        })
    }

    pub fn offline() -> Arc<Self> {
        let radio = Self::online();
        radio.powered.store(false, Ordering::SeqCst);
        radio
    }

    pub fn start_count(&self) -> usize {
        self.starts.lock().unwrap().len()
    }

    pub fn last_session(&self) -> Option<SessionEpoch> {
        self.starts.lock().unwrap().last().map(|(_, session)| *session)
    }

    pub fn last_payload(&self) -> Option<AdvertisementPayload> {
        self.starts.lock().unwrap().last().map(|(payload, _)| payload.clone())
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl RadioAdvertiser for MockAdvertiser {
    fn is_supported(&self) -> bool {
        self.supported.load(Ordering::SeqCst)
    }

    fn is_powered_on(&self) -> bool {
        self.powered.load(Ordering::SeqCst)
    }

    fn start_advertising(&self, payload: &AdvertisementPayload, session: SessionEpoch) {
        self.starts.lock().unwrap().push((payload.clone(), session));
    }

    fn stop_advertising(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MockScanner {
    pub powered: AtomicBool,
    pub starts: Mutex<Vec<(ServiceTag, SessionEpoch)>>,
    pub stops: AtomicUsize,
}

impl MockScanner {
    pub fn online() -> Arc<Self> {
        Arc::new(Self {
            powered: AtomicBool::new(true),
            starts: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
        })
    }

    pub fn offline() -> Arc<Self> {
        let radio = Self::online();
        radio.powered.store(false, Ordering::SeqCst);
        radio
    }

    pub fn start_count(&self) -> usize {
        self.starts.lock().unwrap().len()
    }

    pub fn last_session(&self) -> Option<SessionEpoch> {
        self.starts.lock().unwrap().last().map(|(_, session)| *session)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl RadioScanner for MockScanner {
    fn is_powered_on(&self) -> bool {
        self.powered.load(Ordering::SeqCst)
    }

    fn start_scanning(&self, filter: &ServiceTag, session: SessionEpoch) {
        self.starts.lock().unwrap().push((*filter, session));
    }

    fn stop_scanning(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

// ----------------------------------------------------------------------------
// Identifier Source
// ----------------------------------------------------------------------------

pub struct FixedSource(pub Identifier);

impl FixedSource {
    pub fn named(bytes: &[u8]) -> Arc<Self> {
        Arc::new(Self(Identifier::from_bytes(bytes)))
    }
}

impl IdentifierSource for FixedSource {
    fn current(&self) -> Identifier {
        self.0.clone()
    }
}

// ----------------------------------------------------------------------------
// Scheduler and Sink
// ----------------------------------------------------------------------------

/// Records armed timers for the test body to fire by hand
#[derive(Default)]
pub struct RecordingScheduler {
    pub scheduled: Mutex<Vec<(Duration, TimerTick)>>,
}

impl RecordingScheduler {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Remove and return everything armed so far
    pub fn take(&self) -> Vec<(Duration, TimerTick)> {
        std::mem::take(&mut *self.scheduled.lock().unwrap())
    }

    pub fn armed(&self) -> usize {
        self.scheduled.lock().unwrap().len()
    }
}

impl Scheduler for RecordingScheduler {
    fn schedule(&self, delay: Duration, tick: TimerTick) {
        self.scheduled.lock().unwrap().push((delay, tick));
    }
}

/// Records every emitted event
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<BeaconEvent>>,
}

impl RecordingSink {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<BeaconEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn sightings(&self) -> Vec<AggregatedSighting> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                BeaconEvent::Sighting(sighting) => Some(sighting.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: BeaconEvent) {
        self.events.lock().unwrap().push(event);
    }
}
