//! Keyed records - the unit carried on the outbound stream.

use serde::{Deserialize, Serialize};

use crate::NotificationEvent;

/// Key prefix used when none is configured.
pub const DEFAULT_KEY_PREFIX: &str = "key_";

/// Derives the partition key for an event id.
///
/// Same id, same key: downstream consumers can shard on it.
pub fn routing_key(prefix: &str, id: i64) -> String {
    format!("{prefix}{id}")
}

/// An event paired with its partition key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyedRecord {
    key: String,
    event: NotificationEvent,
}

impl KeyedRecord {
    /// Wraps `event`, keying it with `prefix` + id.
    pub fn new(prefix: &str, event: NotificationEvent) -> Self {
        Self {
            key: routing_key(prefix, event.id()),
            event,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn event(&self) -> &NotificationEvent {
        &self.event
    }

    /// Unwraps the record, handing the event on unchanged.
    pub fn into_event(self) -> NotificationEvent {
        self.event
    }
}
