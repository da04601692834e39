//! One poll cycle.

use std::collections::HashSet;

use popwatch_pop3::{MessageRef, Session};
use tracing::{debug, info, warn};

use super::{CycleReport, Poller};
use crate::Result;
use crate::config::PollerConfig;
use crate::record::EmittedRecord;
use crate::sink::EmissionSink;
use crate::state::{KnownUidStore, KnownUids};

/// What a cycle got done, kept even when it fails part way.
#[derive(Debug, Default)]
struct Progress {
    listed: usize,
    baseline: bool,
    records: Vec<EmittedRecord>,
}

impl<St, Si> Poller<St, Si>
where
    St: KnownUidStore,
    Si: EmissionSink,
{
    pub(super) async fn run_cycle(&self) -> Result<CycleReport> {
        let mut known = self.store.load(&self.mailbox).await?;
        debug!(
            mailbox = %self.mailbox,
            known = known.len(),
            initialized = known.initialized,
            "Loaded state"
        );

        let mut session = Session::new(self.config.connection());
        let mut progress = Progress::default();
        let processed = process(&mut session, &self.config, &mut known, &mut progress).await;

        let saved = self.store.save(&self.mailbox, &known).await;
        if let Err(e) = &saved {
            warn!(mailbox = %self.mailbox, error = %e, "Failed to save known UIDs");
        }
        session.quit().await;

        let report = CycleReport {
            listed: progress.listed,
            emitted: progress.records.len(),
            baseline: progress.baseline,
        };
        let delivered = if progress.records.is_empty() {
            Ok(())
        } else {
            self.sink.deliver(progress.records).await
        };

        processed?;
        saved?;
        delivered?;
        Ok(report)
    }
}

async fn process(
    session: &mut Session,
    config: &PollerConfig,
    known: &mut KnownUids,
    progress: &mut Progress,
) -> Result<()> {
    session.connect().await?;
    session.login().await?;

    let listing = session.list_uids().await?;
    progress.listed = listing.len();

    if !known.initialized && !config.emit_on_start {
        for message in listing {
            known.insert(message.uid);
        }
        known.initialized = true;
        progress.baseline = true;
        info!(known = known.len(), "Recorded existing messages as baseline");
        return Ok(());
    }
    known.initialized = true;

    for message in select_new(listing, known, config.limit) {
        let raw = session.retrieve(message.index).await?;
        known.insert(message.uid.clone());
        progress.records.push(EmittedRecord::new(&message, raw));
        debug!(%message, "Retrieved message");

        if config.delete_after_emit {
            session.delete(message.index).await?;
        }
    }

    Ok(())
}

/// Picks up to `limit` unknown messages in server order.
///
/// A UID listed twice is taken once.
fn select_new(listing: Vec<MessageRef>, known: &KnownUids, limit: usize) -> Vec<MessageRef> {
    let mut seen = HashSet::new();
    listing
        .into_iter()
        .filter(|m| !known.contains(&m.uid) && seen.insert(m.uid.clone()))
        .take(limit)
        .collect()
}
