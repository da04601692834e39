//! Recurring poll cycles.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use super::{CycleOutcome, Poller};
use crate::sink::EmissionSink;
use crate::state::KnownUidStore;

/// Handle to a running poll loop.
#[derive(Debug)]
pub struct PollerHandle<St, Si> {
    poller: Arc<Poller<St, Si>>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Starts polling on the configured interval.
///
/// The first cycle starts immediately. Ticks that come due while a cycle
/// is still running are dropped, not run late: the next cycle waits for
/// the first tick after the running one finishes.
pub fn spawn<St, Si>(poller: Arc<Poller<St, Si>>) -> PollerHandle<St, Si>
where
    St: KnownUidStore + 'static,
    Si: EmissionSink + 'static,
{
    let (stop, mut stopped) = watch::channel(false);
    let period = poller.config().poll_interval();
    let worker = Arc::clone(&poller);

    let task = tokio::spawn(async move {
        info!(mailbox = %worker.mailbox(), ?period, "Poller started");
        let mut next_tick = Instant::now();
        let mut ticker = interval_at(next_tick, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = stopped.changed() => break,
                _ = ticker.tick() => {}
            }
            // Runs outside the select so a stop request never cuts a cycle short
            worker.poll().await;

            let due = next_tick + period;
            next_tick = next_after(next_tick, period, Instant::now());
            if next_tick > due {
                debug!(mailbox = %worker.mailbox(), "Dropped ticks missed during the cycle");
            }
            ticker.reset_at(next_tick);
        }

        info!(mailbox = %worker.mailbox(), "Poller stopped");
    });

    PollerHandle { poller, stop, task }
}

/// First tick of the schedule that lies strictly after `now`.
fn next_after(mut tick: Instant, period: Duration, now: Instant) -> Instant {
    while tick <= now {
        tick += period;
    }
    tick
}

impl<St, Si> PollerHandle<St, Si>
where
    St: KnownUidStore,
    Si: EmissionSink,
{
    /// Runs a cycle now, outside the schedule.
    ///
    /// Returns [`CycleOutcome::Skipped`] if a scheduled cycle is in flight.
    pub async fn trigger(&self) -> CycleOutcome {
        self.poller.poll().await
    }

    /// Returns the poller.
    pub const fn poller(&self) -> &Arc<Poller<St, Si>> {
        &self.poller
    }

    /// Stops the schedule and waits for any in-flight cycle to finish.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Poller task ended abnormally");
        }
    }
}
