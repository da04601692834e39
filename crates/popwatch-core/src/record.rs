//! Records emitted for newly retrieved messages.

use chrono::{DateTime, Utc};
use popwatch_pop3::MessageRef;
use serde::{Deserialize, Serialize};

/// One newly retrieved message.
///
/// `raw` is the message exactly as the server sent it, with the multi-line
/// terminator removed and dot-stuffing left in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmittedRecord {
    /// Server-assigned unique identifier.
    pub uid: String,
    /// Message number at retrieval time. Only meaningful within that session.
    pub index: u32,
    /// Raw message text.
    pub raw: String,
    /// When the message was retrieved.
    pub retrieved_at: DateTime<Utc>,
}

impl EmittedRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(message: &MessageRef, raw: String) -> Self {
        Self {
            uid: message.uid.clone(),
            index: message.index,
            raw,
            retrieved_at: Utc::now(),
        }
    }
}
