//! Known-UID state model.

use std::collections::BTreeSet;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::Result;

/// UIDs already seen for one mailbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownUids {
    /// Whether a cycle has ever completed the listing step for this mailbox.
    pub initialized: bool,
    /// UIDs that must never be emitted again.
    #[serde(rename = "knownUids")]
    pub uids: BTreeSet<String>,
}

impl KnownUids {
    /// Creates an empty, uninitialized state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `uid` has been seen.
    #[must_use]
    pub fn contains(&self, uid: &str) -> bool {
        self.uids.contains(uid)
    }

    /// Records `uid` as seen. Returns false if it was already known.
    pub fn insert(&mut self, uid: impl Into<String>) -> bool {
        self.uids.insert(uid.into())
    }

    /// Number of known UIDs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.uids.len()
    }

    /// Returns true if no UIDs are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }
}

/// Persistence for [`KnownUids`], keyed by mailbox.
pub trait KnownUidStore: Send + Sync {
    /// Loads the state for `mailbox`, or an empty state if none was saved.
    fn load(&self, mailbox: &str) -> impl Future<Output = Result<KnownUids>> + Send;

    /// Replaces the saved state for `mailbox`.
    fn save(&self, mailbox: &str, state: &KnownUids) -> impl Future<Output = Result<()>> + Send;
}
