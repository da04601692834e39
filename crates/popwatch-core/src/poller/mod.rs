//! Mailbox polling.
//!
//! A [`Poller`] runs one cycle at a time against a single mailbox:
//!
//! 1. Load the known-UID state
//! 2. Connect, authenticate and list UIDs
//! 3. On the first run (unless `emit_on_start`), record everything as
//!    known and stop
//! 4. Otherwise retrieve up to `limit` unknown messages in server order,
//!    marking each known as soon as it is retrieved, and delete it if
//!    `delete_after_emit` is set
//! 5. Save the state, quit, and hand any records to the sink
//!
//! A failure in step 4 keeps the progress made before it. [`spawn`] runs
//! cycles on a fixed interval.

mod cycle;
mod scheduler;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::{PollerConfig, ensure_valid};
use crate::sink::EmissionSink;
use crate::state::KnownUidStore;
use crate::{Error, Result};

pub use scheduler::{PollerHandle, spawn};

/// Summary of a completed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Messages listed by the server.
    pub listed: usize,
    /// Records delivered to the sink.
    pub emitted: usize,
    /// True if this cycle only recorded the mailbox's existing contents.
    pub baseline: bool,
}

/// Result of asking the poller to run a cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The cycle ran to completion.
    Completed(CycleReport),
    /// The cycle failed. Already reported to the sink.
    Failed(Error),
    /// Another cycle was in flight, so nothing ran.
    Skipped,
}

impl CycleOutcome {
    /// Returns the report if the cycle completed.
    #[must_use]
    pub const fn report(&self) -> Option<&CycleReport> {
        match self {
            Self::Completed(report) => Some(report),
            _ => None,
        }
    }

    /// Returns true if the call did nothing because a cycle was running.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// Polls one mailbox.
pub struct Poller<St, Si> {
    config: PollerConfig,
    mailbox: String,
    store: St,
    sink: Si,
    in_flight: Mutex<()>,
}

impl<St, Si> Poller<St, Si>
where
    St: KnownUidStore,
    Si: EmissionSink,
{
    /// Creates a poller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn new(config: PollerConfig, store: St, sink: Si) -> Result<Self> {
        ensure_valid(&config)?;
        let mailbox = config.mailbox_key();
        Ok(Self {
            config,
            mailbox,
            store,
            sink,
            in_flight: Mutex::new(()),
        })
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Returns the key the known-UID state is stored under.
    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }

    /// Returns the state store.
    pub const fn store(&self) -> &St {
        &self.store
    }

    /// Returns the sink.
    pub const fn sink(&self) -> &Si {
        &self.sink
    }

    /// Runs one cycle unless one is already in flight.
    ///
    /// A failed cycle is reported to the sink before this returns.
    pub async fn poll(&self) -> CycleOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!(mailbox = %self.mailbox, "Cycle already running, skipping");
            return CycleOutcome::Skipped;
        };

        match self.run_cycle().await {
            Ok(report) => {
                info!(
                    mailbox = %self.mailbox,
                    listed = report.listed,
                    emitted = report.emitted,
                    baseline = report.baseline,
                    "Poll cycle finished"
                );
                CycleOutcome::Completed(report)
            }
            Err(e) => {
                error!(mailbox = %self.mailbox, error = %e, "Poll cycle failed");
                self.sink.report_failure(&e).await;
                CycleOutcome::Failed(e)
            }
        }
    }
}

impl<St, Si> std::fmt::Debug for Poller<St, Si> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("mailbox", &self.mailbox)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
