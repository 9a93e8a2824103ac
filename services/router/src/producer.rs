//! Ingress producer - hands validated events to the outbound stream.

use std::sync::Arc;

use fanout_events::{KeyedRecord, NotificationEvent};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

/// Errors emitting onto the outbound stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProduceError {
    /// The stream buffer is at capacity. The event was not enqueued.
    #[error("outbound stream is full, rejected record {key}")]
    ChannelFull { key: String },

    /// The router has stopped consuming the stream.
    #[error("outbound stream is closed, rejected record {key}")]
    StreamClosed { key: String },
}

/// Appends keyed records to the bounded outbound stream.
///
/// Cheap to clone; every clone feeds the same stream.
#[derive(Debug, Clone)]
pub struct IngressProducer {
    tx: mpsc::Sender<KeyedRecord>,
    key_prefix: Arc<str>,
}

impl IngressProducer {
    /// Create a producer and the stream receiver it feeds.
    pub fn channel(
        key_prefix: impl Into<Arc<str>>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<KeyedRecord>) {
        let (tx, rx) = mpsc::channel(capacity);
        let producer = Self {
            tx,
            key_prefix: key_prefix.into(),
        };
        (producer, rx)
    }

    /// Emit `event` keyed by its id. Never waits for buffer space.
    pub fn produce(&self, event: NotificationEvent) -> Result<(), ProduceError> {
        info!(
            event_id = event.id(),
            action = event.action(),
            "Emit event: {event}"
        );

        let record = KeyedRecord::new(&self.key_prefix, event);
        self.tx.try_send(record).map_err(|e| match e {
            mpsc::error::TrySendError::Full(record) => ProduceError::ChannelFull {
                key: record.key().to_string(),
            },
            mpsc::error::TrySendError::Closed(record) => ProduceError::StreamClosed {
                key: record.key().to_string(),
            },
        })
    }

    /// Whether the router side of the stream is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
