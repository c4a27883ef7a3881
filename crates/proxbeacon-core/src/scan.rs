//! Scanning lifecycle state machine
//!
//! Duty-cycled scanning: a session runs for a fixed window, cools down to
//! save power, and is resumed by the periodic rescan tick. Sightings are
//! extracted only while the window is open; whatever the radio delivers
//! afterwards completes silently. Window-close and failure callbacks carry
//! the session epoch they belong to, so a timer left over from an earlier
//! session cannot clip the current one short.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::codec::{AdvertisementReport, PayloadCodec};
use crate::error::{BeaconError, Result};
use crate::events::{BeaconEvent, EventSink};
use crate::radio::RadioScanner;
use crate::types::{Identifier, RadioErrorCode, RadioRole, SessionEpoch};

// ----------------------------------------------------------------------------
// State
// ----------------------------------------------------------------------------

/// Externally visible scanning state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanState {
    /// No session active
    Idle,
    /// The scan window is open; matching advertisements become sightings
    Scanning,
    /// The window elapsed; waiting for the rescan tick to resume
    CoolingDown,
}

// ----------------------------------------------------------------------------
// Controller
// ----------------------------------------------------------------------------

/// State machine governing the scan session
pub struct ScanController {
    state: ScanState,
    session: SessionEpoch,
    radio: Arc<dyn RadioScanner>,
    codec: PayloadCodec,
    sink: Arc<dyn EventSink>,
}

impl ScanController {
    pub fn new(
        radio: Arc<dyn RadioScanner>,
        codec: PayloadCodec,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            state: ScanState::Idle,
            session: SessionEpoch::initial(),
            radio,
            codec,
            sink,
        }
    }

    /// Current state
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Epoch of the most recently opened scan window
    pub fn session(&self) -> SessionEpoch {
        self.session
    }

    /// Open a scan window. No-op while one is already open; resumes from
    /// both `CoolingDown` and `Idle` (which is how a failed session gets
    /// retried on the next rescan tick).
    pub fn start(&mut self) -> Result<()> {
        if self.state == ScanState::Scanning {
            debug!("scan start ignored: window already open");
            return Ok(());
        }
        if !self.radio.is_powered_on() {
            warn!("scan start rejected: radio unavailable");
            return Err(BeaconError::RadioUnavailable {
                role: RadioRole::Scanner,
            });
        }
        let session = self.session.advance();
        let filter = self.codec.tag();
        info!(session = session.value(), "opening scan window");
        self.radio.start_scanning(&filter, session);
        self.transition(ScanState::Scanning);
        Ok(())
    }

    /// Close the session. Idempotent.
    pub fn stop(&mut self) {
        match self.state {
            ScanState::Idle => {}
            ScanState::Scanning => {
                info!("stopping scan");
                self.radio.stop_scanning();
                self.transition(ScanState::Idle);
            }
            ScanState::CoolingDown => {
                // The radio already stopped when the window closed.
                self.transition(ScanState::Idle);
            }
        }
    }

    /// The scan-duration timer for `session` fired: close the window and
    /// cool down. A tick from a previous session is discarded.
    pub fn on_scan_window_elapsed(&mut self, session: SessionEpoch) {
        if session != self.session || self.state != ScanState::Scanning {
            debug!(session = session.value(), "discarding stale window close");
            return;
        }
        info!(session = session.value(), "scan window elapsed; cooling down");
        self.radio.stop_scanning();
        self.transition(ScanState::CoolingDown);
    }

    /// The radio reported a scan failure for `session`.
    ///
    /// Surfaced as-is and the controller lands in `Idle`: a scan session
    /// cannot usefully self-retry without the operator knowing the cause,
    /// so resumption is left to the next rescan tick.
    pub fn on_scan_failed(&mut self, session: SessionEpoch, code: RadioErrorCode) {
        if session != self.session || self.state != ScanState::Scanning {
            debug!(session = session.value(), "discarding stale scan failure");
            return;
        }
        warn!(code = code.code(), "scan failed");
        self.sink.emit(BeaconEvent::ScanFailed(code));
        self.transition(ScanState::Idle);
    }

    /// Extract the advertised identifier from a received report.
    ///
    /// Returns `None` outside an open window (late radio deliveries complete
    /// silently) and for reports that fail to decode, which is expected
    /// foreign or malformed BLE traffic, not an error.
    pub fn handle_advertisement(&self, report: &AdvertisementReport) -> Option<Identifier> {
        if self.state != ScanState::Scanning {
            return None;
        }
        self.codec.decode(report)
    }

    fn transition(&mut self, next: ScanState) {
        if self.state != next {
            self.state = next;
            self.sink.emit(BeaconEvent::ScanStateChanged(next));
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ServiceTag;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    const TAG: ServiceTag = ServiceTag::new(Uuid::from_u128(0x6E40A001_B5A3_F393_E0A9_E50E24DCCA9E));

    struct MockScanner {
        powered: AtomicBool,
        starts: Mutex<Vec<(ServiceTag, SessionEpoch)>>,
        stops: AtomicUsize,
    }

    impl MockScanner {
        fn online() -> Arc<Self> {
            Arc::new(Self {
                powered: AtomicBool::new(true),
                starts: Mutex::new(Vec::new()),
                stops: AtomicUsize::new(0),
            })
        }

        fn start_count(&self) -> usize {
            self.starts.lock().unwrap().len()
        }

        fn stop_count(&self) -> usize {
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

    fn controller(radio: Arc<MockScanner>) -> (ScanController, Arc<Mutex<Vec<BeaconEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink_events = events.clone();
        let sink: Arc<dyn EventSink> =
            Arc::new(move |event: BeaconEvent| sink_events.lock().unwrap().push(event));
        let controller = ScanController::new(radio, PayloadCodec::new(TAG, 31), sink);
        (controller, events)
    }

    #[test]
    fn test_duty_cycle() {
        let radio = MockScanner::online();
        let (mut ctrl, _) = controller(radio.clone());

        ctrl.start().unwrap();
        assert_eq!(ctrl.state(), ScanState::Scanning);
        let first = ctrl.session();

        ctrl.on_scan_window_elapsed(first);
        assert_eq!(ctrl.state(), ScanState::CoolingDown);
        assert_eq!(radio.stop_count(), 1);

        // Rescan tick resumes with a fresh session
        ctrl.start().unwrap();
        assert_eq!(ctrl.state(), ScanState::Scanning);
        assert_eq!(radio.start_count(), 2);
        assert!(ctrl.session() > first);
    }

    #[test]
    fn test_start_is_idempotent_while_scanning() {
        let radio = MockScanner::online();
        let (mut ctrl, _) = controller(radio.clone());

        ctrl.start().unwrap();
        ctrl.start().unwrap();
        assert_eq!(radio.start_count(), 1);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let radio = MockScanner::online();
        let (mut ctrl, events) = controller(radio.clone());

        ctrl.stop();
        assert_eq!(radio.stop_count(), 0);
        assert!(events.lock().unwrap().is_empty());

        ctrl.start().unwrap();
        ctrl.stop();
        ctrl.stop();
        assert_eq!(radio.stop_count(), 1);
        assert_eq!(ctrl.state(), ScanState::Idle);
    }

    #[test]
    fn test_stale_window_close_cannot_clip_new_session() {
        let radio = MockScanner::online();
        let (mut ctrl, _) = controller(radio.clone());

        ctrl.start().unwrap();
        let first = ctrl.session();
        ctrl.on_scan_window_elapsed(first);
        ctrl.start().unwrap();

        // The first session's timer fires again after the rescan
        ctrl.on_scan_window_elapsed(first);
        assert_eq!(ctrl.state(), ScanState::Scanning);
        assert_eq!(radio.stop_count(), 1);
    }

    #[test]
    fn test_scan_failure_surfaces_and_idles() {
        let radio = MockScanner::online();
        let (mut ctrl, events) = controller(radio.clone());

        ctrl.start().unwrap();
        let code = RadioErrorCode::new(5);
        ctrl.on_scan_failed(ctrl.session(), code);

        assert_eq!(ctrl.state(), ScanState::Idle);
        assert!(events
            .lock()
            .unwrap()
            .contains(&BeaconEvent::ScanFailed(code)));

        // Stale failure after the session is gone changes nothing
        let before = events.lock().unwrap().len();
        ctrl.on_scan_failed(ctrl.session(), code);
        assert_eq!(events.lock().unwrap().len(), before);
    }

    #[test]
    fn test_powered_off_radio_rejects_start() {
        let radio = MockScanner::online();
        radio.powered.store(false, Ordering::SeqCst);
        let (mut ctrl, _) = controller(radio.clone());

        assert_eq!(
            ctrl.start(),
            Err(BeaconError::RadioUnavailable {
                role: RadioRole::Scanner
            })
        );
        assert_eq!(radio.start_count(), 0);
    }

    #[test]
    fn test_sightings_only_while_window_open() {
        let radio = MockScanner::online();
        let (mut ctrl, _) = controller(radio.clone());

        let report = AdvertisementReport::new(-55).with_service_data(TAG, b"peer-1".to_vec());
        assert_eq!(ctrl.handle_advertisement(&report), None);

        ctrl.start().unwrap();
        assert_eq!(
            ctrl.handle_advertisement(&report),
            Some(Identifier::from_bytes(b"peer-1"))
        );

        // Foreign traffic is dropped silently
        let noise = AdvertisementReport::new(-70);
        assert_eq!(ctrl.handle_advertisement(&noise), None);

        ctrl.on_scan_window_elapsed(ctrl.session());
        assert_eq!(ctrl.handle_advertisement(&report), None);
    }
}
