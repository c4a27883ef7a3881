//! Tokio runtime around the beacon supervisor
//!
//! The supervisor is not safe for concurrent lifecycle calls; this wrapper
//! is the single coordination point: every entry point — host calls, radio
//! completions, timer ticks — goes through one `tokio::sync::Mutex`.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

use proxbeacon_core::{
    AdvertiseState, AdvertisementReport, BeaconConfig, BeaconEvent, BeaconSupervisor, EventSink,
    IdentifierSource, RadioAdvertiser, RadioErrorCode, RadioScanner, ScanState, SessionEpoch,
    SupervisorState, SystemTimeSource, TimeSource,
};

use crate::scheduler::TokioScheduler;

// ----------------------------------------------------------------------------
// Event Channel Sink
// ----------------------------------------------------------------------------

/// Relays core events into an unbounded channel for the host to consume
struct ChannelSink {
    events: mpsc::UnboundedSender<BeaconEvent>,
}

impl EventSink for ChannelSink {
    fn emit(&self, event: BeaconEvent) {
        // A closed receiver just means the host stopped listening.
        let _ = self.events.send(event);
    }
}

// ----------------------------------------------------------------------------
// Builder
// ----------------------------------------------------------------------------

/// Builder for [`BeaconRuntime`]
pub struct BeaconRuntimeBuilder<C: TimeSource = SystemTimeSource> {
    config: BeaconConfig,
    advertiser: Arc<dyn RadioAdvertiser>,
    scanner: Arc<dyn RadioScanner>,
    source: Arc<dyn IdentifierSource>,
    clock: C,
}

impl BeaconRuntimeBuilder<SystemTimeSource> {
    /// Start a builder from the three required collaborators
    pub fn new(
        advertiser: Arc<dyn RadioAdvertiser>,
        scanner: Arc<dyn RadioScanner>,
        source: Arc<dyn IdentifierSource>,
    ) -> Self {
        Self {
            config: BeaconConfig::default(),
            advertiser,
            scanner,
            source,
            clock: SystemTimeSource,
        }
    }
}

impl<C: TimeSource + Send + 'static> BeaconRuntimeBuilder<C> {
    /// Override the default configuration
    pub fn with_config(mut self, config: BeaconConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the wall clock (tests drive the core on a manual clock)
    pub fn with_clock<D: TimeSource + Send + 'static>(self, clock: D) -> BeaconRuntimeBuilder<D> {
        BeaconRuntimeBuilder {
            config: self.config,
            advertiser: self.advertiser,
            scanner: self.scanner,
            source: self.source,
            clock,
        }
    }

    /// Build the runtime and the event stream.
    ///
    /// Must be called inside a tokio runtime: the tick driver task is
    /// spawned here.
    pub fn build(self) -> (BeaconRuntime<C>, mpsc::UnboundedReceiver<BeaconEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();

        let supervisor = Arc::new(Mutex::new(BeaconSupervisor::with_clock(
            self.config,
            self.advertiser,
            self.scanner,
            self.source,
            Arc::new(TokioScheduler::new(tick_tx)),
            Arc::new(ChannelSink { events: event_tx }),
            self.clock,
        )));

        let driver_supervisor = supervisor.clone();
        let driver = tokio::spawn(async move {
            while let Some(tick) = tick_rx.recv().await {
                driver_supervisor.lock().await.handle_tick(tick);
            }
            debug!("tick driver finished");
        });

        (BeaconRuntime { supervisor, driver }, event_rx)
    }
}

// ----------------------------------------------------------------------------
// Runtime
// ----------------------------------------------------------------------------

/// Owns the supervisor lock and the tick driver task; the host's BLE glue
/// forwards radio callbacks into the `on_*` entry points.
pub struct BeaconRuntime<C: TimeSource = SystemTimeSource> {
    supervisor: Arc<Mutex<BeaconSupervisor<C>>>,
    driver: JoinHandle<()>,
}

impl<C: TimeSource + Send + 'static> BeaconRuntime<C> {
    /// Start advertising and scanning and arm the periodic timers
    pub async fn start(&self) {
        self.supervisor.lock().await.start();
    }

    /// Stop both lifecycles and cancel the timers
    pub async fn stop(&self) {
        self.supervisor.lock().await.stop();
    }

    /// Stop and tear down the tick driver
    pub async fn shutdown(self) {
        self.supervisor.lock().await.stop();
        self.driver.abort();
    }

    /// Radio completion for an advertise start
    pub async fn on_advertise_result(
        &self,
        session: SessionEpoch,
        result: Result<(), RadioErrorCode>,
    ) {
        self.supervisor
            .lock()
            .await
            .on_advertise_result(session, result);
    }

    /// Radio-reported scan failure
    pub async fn on_scan_failed(&self, session: SessionEpoch, code: RadioErrorCode) {
        self.supervisor.lock().await.on_scan_failed(session, code);
    }

    /// A raw advertisement from the scanning radio
    pub async fn on_advertisement(&self, report: &AdvertisementReport) {
        self.supervisor.lock().await.on_advertisement(report);
    }

    /// Current supervisor state
    pub async fn state(&self) -> SupervisorState {
        self.supervisor.lock().await.state()
    }

    /// Current advertising state
    pub async fn advertise_state(&self) -> AdvertiseState {
        self.supervisor.lock().await.advertise_state()
    }

    /// Current scanning state
    pub async fn scan_state(&self) -> ScanState {
        self.supervisor.lock().await.scan_state()
    }
}
