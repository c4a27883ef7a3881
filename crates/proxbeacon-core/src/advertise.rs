//! Advertising lifecycle state machine
//!
//! Governs start/stop/refresh of local advertising against a radio whose
//! start outcome arrives later, on an arbitrary thread. Start is idempotent,
//! so a second call before the first outcome lands cannot create a duplicate
//! radio session. A stop or refresh that races an in-flight start is recorded
//! as a pending intent and applied exactly once, after the outcome lands;
//! completions from a previous session are recognized by epoch and discarded.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::codec::PayloadCodec;
use crate::error::{BeaconError, Result};
use crate::events::{BeaconEvent, EventSink};
use crate::identity::IdentifierSource;
use crate::radio::RadioAdvertiser;
use crate::types::{RadioErrorCode, RadioRole, SessionEpoch};

// ----------------------------------------------------------------------------
// State
// ----------------------------------------------------------------------------

/// Externally visible advertising state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvertiseState {
    /// No session active or pending
    Idle,
    /// A radio start was issued; its outcome has not landed yet
    Starting,
    /// The radio confirmed the session
    Advertising,
    /// The radio rejected the start; retried on the next periodic refresh
    Failed(RadioErrorCode),
}

/// Intent recorded while a start is in flight, applied when it settles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingIntent {
    None,
    Stop,
    Restart,
}

// ----------------------------------------------------------------------------
// Controller
// ----------------------------------------------------------------------------

/// State machine governing the local advertising session
pub struct AdvertiseController {
    state: AdvertiseState,
    session: SessionEpoch,
    pending: PendingIntent,
    radio: Arc<dyn RadioAdvertiser>,
    source: Arc<dyn IdentifierSource>,
    codec: PayloadCodec,
    sink: Arc<dyn EventSink>,
}

impl AdvertiseController {
    pub fn new(
        radio: Arc<dyn RadioAdvertiser>,
        source: Arc<dyn IdentifierSource>,
        codec: PayloadCodec,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            state: AdvertiseState::Idle,
            session: SessionEpoch::initial(),
            pending: PendingIntent::None,
            radio,
            source,
            codec,
            sink,
        }
    }

    /// Current state
    pub fn state(&self) -> AdvertiseState {
        self.state
    }

    /// Epoch of the most recently issued session
    pub fn session(&self) -> SessionEpoch {
        self.session
    }

    /// True once no radio completion is outstanding
    pub fn is_settled(&self) -> bool {
        !matches!(self.state, AdvertiseState::Starting)
    }

    /// Start advertising the current identifier.
    ///
    /// No-op while a session is already starting or active. All
    /// preconditions are checked before the radio is touched; on `Err` the
    /// state is unchanged. Encoding happens here, at start time, which is
    /// what makes identifier rotation take effect on the next refresh.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            AdvertiseState::Starting => {
                // A deferred stop followed by a start means the caller wants
                // the session alive after all.
                if self.pending == PendingIntent::Stop {
                    self.pending = PendingIntent::Restart;
                }
                debug!("advertise start ignored: session already starting");
                return Ok(());
            }
            AdvertiseState::Advertising => {
                debug!("advertise start ignored: session already active");
                return Ok(());
            }
            AdvertiseState::Idle | AdvertiseState::Failed(_) => {}
        }

        if !self.radio.is_supported() || !self.radio.is_powered_on() {
            warn!("advertise start rejected: radio unavailable");
            return Err(BeaconError::RadioUnavailable {
                role: RadioRole::Advertiser,
            });
        }

        let payload = self.codec.encode(&self.source.current())?;
        let session = self.session.advance();
        self.pending = PendingIntent::None;
        self.transition(AdvertiseState::Starting);
        info!(session = session.value(), "starting advertising");
        self.radio.start_advertising(&payload, session);
        Ok(())
    }

    /// Stop advertising. Idempotent.
    ///
    /// A stop racing an in-flight start is deferred and applied when the
    /// start outcome lands, so the radio is never told to stop a session it
    /// has not confirmed yet.
    pub fn stop(&mut self) {
        match self.state {
            AdvertiseState::Idle => {}
            AdvertiseState::Starting => {
                debug!("stop requested while start in flight; deferring");
                self.pending = PendingIntent::Stop;
            }
            AdvertiseState::Advertising => {
                info!("stopping advertising");
                self.radio.stop_advertising();
                self.transition(AdvertiseState::Idle);
            }
            AdvertiseState::Failed(_) => {
                // Nothing is running on the radio; just settle the state.
                self.transition(AdvertiseState::Idle);
            }
        }
    }

    /// Stop and immediately start again, re-encoding the identifier.
    ///
    /// This is how rotation reaches the air: the periodic refresh tick calls
    /// it, and the fresh start re-fetches the current identifier.
    pub fn refresh(&mut self) -> Result<()> {
        if matches!(self.state, AdvertiseState::Starting) {
            // Applied once the in-flight start settles.
            self.pending = PendingIntent::Restart;
            return Ok(());
        }
        self.stop();
        self.start()
    }

    /// Radio completion for the start issued with `session`.
    ///
    /// Completions that echo a stale epoch, or arrive when no start is in
    /// flight, are discarded without any state transition.
    pub fn on_start_result(
        &mut self,
        session: SessionEpoch,
        result: core::result::Result<(), RadioErrorCode>,
    ) {
        if session != self.session || !matches!(self.state, AdvertiseState::Starting) {
            debug!(
                session = session.value(),
                "discarding stale advertise completion"
            );
            return;
        }

        match result {
            Ok(()) => match self.pending {
                PendingIntent::None => {
                    info!(session = session.value(), "advertising started");
                    self.transition(AdvertiseState::Advertising);
                }
                PendingIntent::Stop => {
                    self.pending = PendingIntent::None;
                    info!("applying deferred advertise stop");
                    self.radio.stop_advertising();
                    self.transition(AdvertiseState::Idle);
                }
                PendingIntent::Restart => {
                    self.pending = PendingIntent::None;
                    info!("applying deferred advertise restart");
                    self.radio.stop_advertising();
                    self.transition(AdvertiseState::Idle);
                    if let Err(err) = self.start() {
                        warn!(%err, "deferred advertise restart failed");
                    }
                }
            },
            Err(code) => {
                warn!(code = code.code(), "advertising failed to start");
                let deferred_stop = self.pending == PendingIntent::Stop;
                self.pending = PendingIntent::None;
                if deferred_stop {
                    // The session died on its own; the stop is moot.
                    self.transition(AdvertiseState::Idle);
                } else {
                    // Not retried here: the next periodic refresh is the
                    // retry path once the operator knows the cause.
                    self.transition(AdvertiseState::Failed(code));
                }
            }
        }
    }

    fn transition(&mut self, next: AdvertiseState) {
        if self.state != next {
            self.state = next;
            self.sink.emit(BeaconEvent::AdvertiseStateChanged(next));
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
