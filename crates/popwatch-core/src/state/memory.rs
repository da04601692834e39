//! In-memory known-UID store.

use std::collections::HashMap;

use tokio::sync::Mutex;

use super::model::{KnownUidStore, KnownUids};
use crate::Result;

/// Keeps known-UID state in process memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    entries: Mutex<HashMap<String, KnownUids>>,
}

impl MemoryStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the state saved for `mailbox`, if any.
    pub async fn get(&self, mailbox: &str) -> Option<KnownUids> {
        self.entries.lock().await.get(mailbox).cloned()
    }
}

impl KnownUidStore for MemoryStateStore {
    async fn load(&self, mailbox: &str) -> Result<KnownUids> {
        Ok(self.get(mailbox).await.unwrap_or_default())
    }

    async fn save(&self, mailbox: &str, state: &KnownUids) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(mailbox.to_string(), state.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip() {
        let store = MemoryStateStore::new();
        assert!(store.get("inbox").await.is_none());
        assert_eq!(store.load("inbox").await.unwrap(), KnownUids::new());

        let mut state = KnownUids::new();
        state.initialized = true;
        state.insert("x");
        store.save("inbox", &state).await.unwrap();

        assert_eq!(store.get("inbox").await, Some(state));
    }
}
