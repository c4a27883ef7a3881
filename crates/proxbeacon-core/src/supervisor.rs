//! Top-level beacon orchestration
//!
//! Composes the advertise and scan controllers with the sighting aggregator
//! behind one coordination point; the host must serialize every call (the
//! runtime crate wraps this in a mutex). Timer ticks and radio completions
//! carry epoch tokens, so cancellation is a synchronous epoch bump: anything
//! already in flight from a previous session is recognized on delivery and
//! discarded instead of acted on.

use std::sync::Arc;

use core::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::advertise::{AdvertiseController, AdvertiseState};
use crate::aggregator::SightingAggregator;
use crate::codec::{AdvertisementReport, PayloadCodec};
use crate::config::BeaconConfig;
use crate::events::{BeaconEvent, EventSink};
use crate::identity::IdentifierSource;
use crate::radio::{RadioAdvertiser, RadioScanner};
use crate::scan::{ScanController, ScanState};
use crate::types::{RadioErrorCode, SessionEpoch, Sighting, SystemTimeSource, TimeSource};

// ----------------------------------------------------------------------------
// Timer Plumbing
// ----------------------------------------------------------------------------

/// What a timer tick is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickKind {
    /// Rotate the advertised identifier by stop + start
    AdvertiseRefresh,
    /// Resume a cooled-down (or failed) scan session
    ScanRescan,
    /// Close the open scan window; carries the scan session it belongs to
    ScanWindowClose(SessionEpoch),
}

/// An epoch-tagged timer tick.
///
/// Ticks whose epoch predates the current supervisor session are discarded
/// on delivery, which makes timer cancellation a synchronous epoch bump
/// rather than a race against a callback already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerTick {
    pub epoch: SessionEpoch,
    pub kind: TickKind,
}

/// Timer collaborator: deliver `tick` back into
/// `BeaconSupervisor::handle_tick` after `delay`.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, tick: TimerTick);
}

// ----------------------------------------------------------------------------
// Supervisor
// ----------------------------------------------------------------------------

/// Supervisor lifecycle; explicit states instead of ad-hoc "is stopping"
/// flags scattered across shutdown paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupervisorState {
    /// Not running; timers disarmed, controllers idle
    Stopped,
    /// Controllers started, timers armed
    Running,
    /// Stop requested while an advertise start was in flight; settles to
    /// `Stopped` when the completion lands
    Stopping,
}

/// Orchestrates the two radio lifecycles and the aggregator; the only
/// component the host environment talks to.
pub struct BeaconSupervisor<C: TimeSource = SystemTimeSource> {
    state: SupervisorState,
    epoch: SessionEpoch,
    advertiser: AdvertiseController,
    scanner: ScanController,
    aggregator: SightingAggregator,
    scheduler: Arc<dyn Scheduler>,
    sink: Arc<dyn EventSink>,
    clock: C,
    config: BeaconConfig,
}

impl BeaconSupervisor<SystemTimeSource> {
    /// Create a supervisor on the wall clock
    pub fn new(
        config: BeaconConfig,
        advertiser_radio: Arc<dyn RadioAdvertiser>,
        scanner_radio: Arc<dyn RadioScanner>,
        source: Arc<dyn IdentifierSource>,
        scheduler: Arc<dyn Scheduler>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self::with_clock(
            config,
            advertiser_radio,
            scanner_radio,
            source,
            scheduler,
            sink,
            SystemTimeSource,
        )
    }
}

impl<C: TimeSource> BeaconSupervisor<C> {
    /// Create a supervisor on a custom clock
    pub fn with_clock(
        config: BeaconConfig,
        advertiser_radio: Arc<dyn RadioAdvertiser>,
        scanner_radio: Arc<dyn RadioScanner>,
        source: Arc<dyn IdentifierSource>,
        scheduler: Arc<dyn Scheduler>,
        sink: Arc<dyn EventSink>,
        clock: C,
    ) -> Self {
        let codec = PayloadCodec::new(config.service_tag, config.advertisement_budget);
        let advertiser =
            AdvertiseController::new(advertiser_radio, source, codec.clone(), sink.clone());
        let scanner = ScanController::new(scanner_radio, codec, sink.clone());
        let aggregator = SightingAggregator::new(config.aggregation_window, config.prune_windows);
        Self {
            state: SupervisorState::Stopped,
            epoch: SessionEpoch::initial(),
            advertiser,
            scanner,
            aggregator,
            scheduler,
            sink,
            clock,
            config,
        }
    }

    /// Current supervisor state
    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Current advertising state
    pub fn advertise_state(&self) -> AdvertiseState {
        self.advertiser.state()
    }

    /// Current scanning state
    pub fn scan_state(&self) -> ScanState {
        self.scanner.state()
    }

    /// Start both radio lifecycles and arm the periodic timers. Idempotent
    /// while running.
    ///
    /// A controller that cannot start (radio off, oversized payload) is
    /// surfaced through the sink and retried by the next periodic tick; it
    /// never blocks the other controller, and the timers are armed
    /// regardless so the retry path exists.
    pub fn start(&mut self) {
        if self.state == SupervisorState::Running {
            debug!("supervisor start ignored: already running");
            return;
        }
        let epoch = self.epoch.advance();
        self.state = SupervisorState::Running;
        info!(epoch = epoch.value(), "beacon supervisor starting");

        if let Err(err) = self.advertiser.start() {
            warn!(%err, "advertiser did not start");
            self.sink.emit(BeaconEvent::Fault(err));
        }
        if let Err(err) = self.scanner.start() {
            warn!(%err, "scanner did not start");
            self.sink.emit(BeaconEvent::Fault(err));
        }
        self.arm_scan_window_close();
        self.scheduler.schedule(
            self.config.advertise_refresh_interval,
            TimerTick {
                epoch,
                kind: TickKind::AdvertiseRefresh,
            },
        );
        self.scheduler.schedule(
            self.config.scan_rescan_interval,
            TimerTick {
                epoch,
                kind: TickKind::ScanRescan,
            },
        );
    }

    /// Stop everything. Idempotent.
    ///
    /// Timers are cancelled synchronously by advancing the epoch; a tick
    /// already in flight is discarded on delivery. If an advertise start is
    /// still unresolved, the supervisor stays `Stopping` until its
    /// completion lands and the deferred stop is applied.
    pub fn stop(&mut self) {
        if self.state != SupervisorState::Running {
            debug!("supervisor stop ignored: not running");
            return;
        }
        info!("beacon supervisor stopping");
        self.epoch.advance();
        self.scanner.stop();
        self.advertiser.stop();
        self.aggregator.clear();
        self.state = if self.advertiser.is_settled() {
            SupervisorState::Stopped
        } else {
            SupervisorState::Stopping
        };
    }

    /// Timer tick delivery point. Stale ticks are discarded.
    pub fn handle_tick(&mut self, tick: TimerTick) {
        if tick.epoch != self.epoch || self.state != SupervisorState::Running {
            debug!(?tick, "discarding stale timer tick");
            return;
        }
        match tick.kind {
            TickKind::AdvertiseRefresh => {
                if let Err(err) = self.advertiser.refresh() {
                    warn!(%err, "advertise refresh failed");
                    self.sink.emit(BeaconEvent::Fault(err));
                }
                self.scheduler.schedule(
                    self.config.advertise_refresh_interval,
                    TimerTick {
                        epoch: self.epoch,
                        kind: TickKind::AdvertiseRefresh,
                    },
                );
            }
            TickKind::ScanRescan => {
                let was_scanning = self.scanner.state() == ScanState::Scanning;
                if let Err(err) = self.scanner.start() {
                    warn!(%err, "scan resume failed");
                    self.sink.emit(BeaconEvent::Fault(err));
                }
                if !was_scanning {
                    self.arm_scan_window_close();
                }
                self.scheduler.schedule(
                    self.config.scan_rescan_interval,
                    TimerTick {
                        epoch: self.epoch,
                        kind: TickKind::ScanRescan,
                    },
                );
            }
            TickKind::ScanWindowClose(session) => {
                self.scanner.on_scan_window_elapsed(session);
            }
        }
        self.flush_sightings();
    }

    /// Radio completion for an advertise start.
    ///
    /// Forwarded even while stopping: a deferred stop is applied when the
    /// completion lands, after which the supervisor settles to `Stopped`.
    pub fn on_advertise_result(
        &mut self,
        session: SessionEpoch,
        result: core::result::Result<(), RadioErrorCode>,
    ) {
        self.advertiser.on_start_result(session, result);
        if self.state == SupervisorState::Stopping && self.advertiser.is_settled() {
            info!("deferred advertiser stop settled");
            self.state = SupervisorState::Stopped;
        }
    }

    /// Radio-reported scan failure. Stale sessions are discarded inside the
    /// scan controller.
    pub fn on_scan_failed(&mut self, session: SessionEpoch, code: RadioErrorCode) {
        self.scanner.on_scan_failed(session, code);
    }

    /// A raw advertisement from the scanning radio.
    ///
    /// Sightings delivered after `stop()` has begun complete silently
    /// without reviving the scanner.
    pub fn on_advertisement(&mut self, report: &AdvertisementReport) {
        if self.state != SupervisorState::Running {
            return;
        }
        let identifier = match self.scanner.handle_advertisement(report) {
            Some(identifier) => identifier,
            None => return,
        };
        let sighting = Sighting {
            identifier,
            rssi: report.rssi,
            observed_at: self.clock.now(),
        };
        if let Some(aggregated) = self.aggregator.observe(sighting) {
            self.sink.emit(BeaconEvent::Sighting(aggregated));
        }
    }

    fn arm_scan_window_close(&self) {
        if self.scanner.state() == ScanState::Scanning {
            self.scheduler.schedule(
                self.config.scan_session_duration,
                TimerTick {
                    epoch: self.epoch,
                    kind: TickKind::ScanWindowClose(self.scanner.session()),
                },
            );
        }
    }

    fn flush_sightings(&mut self) {
        for aggregated in self.aggregator.drain_expired(self.clock.now()) {
            self.sink.emit(BeaconEvent::Sighting(aggregated));
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
