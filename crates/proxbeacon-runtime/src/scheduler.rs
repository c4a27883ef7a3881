//! Tokio-backed timer driver

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use proxbeacon_core::{Scheduler, TimerTick};

// ----------------------------------------------------------------------------
// Scheduler
// ----------------------------------------------------------------------------

/// Sleeps on the tokio timer wheel and forwards the tick over a channel;
/// the runtime's driver task applies it under the supervisor lock.
///
/// Cancellation is epoch-based: a tick that outlives its session is
/// discarded by the supervisor on delivery, so nothing here needs to race
/// an abort against the timer firing.
#[derive(Clone)]
pub struct TokioScheduler {
    ticks: mpsc::UnboundedSender<TimerTick>,
}

impl TokioScheduler {
    /// Create a scheduler delivering into `ticks`
    pub fn new(ticks: mpsc::UnboundedSender<TimerTick>) -> Self {
        Self { ticks }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, tick: TimerTick) {
        let ticks = self.ticks.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if ticks.send(tick).is_err() {
                debug!(?tick, "tick dropped: runtime shut down");
            }
        });
    }
}
