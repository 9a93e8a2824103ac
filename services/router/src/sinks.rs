//! Terminal event sinks and the per-channel consumers that feed them.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use fanout_events::NotificationEvent;
use tracing::{error, info, instrument};

use crate::routing::ChannelReceiver;

/// Terminal handler for routed events.
///
/// Called once per event, in channel order. Implementations must not
/// block for long; they run on the consumer task of each channel. A panic
/// is logged and the event counted as failed; the channel keeps draining.
pub trait EventSink: Send + Sync + 'static {
    fn accept(&self, channel: &str, event: &NotificationEvent);
}

/// Logs receipt of each event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl EventSink for LoggingSink {
    fn accept(&self, channel: &str, event: &NotificationEvent) {
        info!(
            channel = channel,
            event_id = event.id(),
            "Data received from {channel}... {}",
            event.action()
        );
    }
}

/// One event as seen by a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub channel: String,
    pub event: NotificationEvent,
}

/// Keeps every delivery in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events received on `channel`, in arrival order.
    pub fn events_for(&self, channel: &str) -> Vec<NotificationEvent> {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|d| d.channel == channel)
            .map(|d| d.event.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for RecordingSink {
    fn accept(&self, channel: &str, event: &NotificationEvent) {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Delivery {
                channel: channel.to_string(),
                event: event.clone(),
            });
    }
}

/// Drains one output channel into a sink.
pub struct ChannelConsumer {
    receiver: ChannelReceiver,
    sink: Arc<dyn EventSink>,
}

impl ChannelConsumer {
    pub fn new(receiver: ChannelReceiver, sink: Arc<dyn EventSink>) -> Self {
        Self { receiver, sink }
    }

    /// Run until the channel closes and is empty.
    #[instrument(skip(self), fields(channel = %self.receiver.name), name = "channel_consumer")]
    pub async fn run(mut self) {
        let mut consumed: u64 = 0;
        let mut failed: u64 = 0;
        while let Some(event) = self.receiver.rx.recv().await {
            let accepted = panic::catch_unwind(AssertUnwindSafe(|| {
                self.sink.accept(&self.receiver.name, &event)
            }));
            match accepted {
                Ok(()) => consumed += 1,
                Err(payload) => {
                    failed += 1;
                    error!(
                        event_id = event.id(),
                        panic = panic_message(payload.as_ref()),
                        "Sink panicked while handling event"
                    );
                }
            }
        }
        info!(consumed = consumed, failed = failed, "Channel closed, consumer stopped");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
