//! Dispatch table from branches to output channels.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fanout_events::NotificationEvent;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use super::{channel_name_for, BranchId, Classifier, RoutingConfig};

/// Errors delivering a classified event to its channel.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The channel's consumer has stopped.
    #[error("output channel {channel} is closed")]
    ChannelClosed { channel: String },
}

/// Receiving half of one output channel, handed to its consumer.
#[derive(Debug)]
pub struct ChannelReceiver {
    pub name: String,
    pub rx: mpsc::Receiver<NotificationEvent>,
}

/// Point-in-time view of one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ChannelSnapshot {
    pub name: String,
    /// Known value served by the channel; `None` for the catch-all.
    pub discriminant: Option<String>,
    pub delivered: u64,
}

#[derive(Debug)]
struct ChannelCounter {
    name: String,
    discriminant: Option<String>,
    delivered: AtomicU64,
}

/// Per-channel delivery counters, shared with the HTTP layer.
///
/// Counters are observational; routing never reads them.
#[derive(Debug, Clone)]
pub struct ChannelStats {
    counters: Arc<Vec<ChannelCounter>>,
}

impl ChannelStats {
    fn new(config: &RoutingConfig) -> Self {
        let counters = config
            .known_values
            .iter()
            .map(|value| ChannelCounter {
                name: channel_name_for(value),
                discriminant: Some(value.clone()),
                delivered: AtomicU64::new(0),
            })
            .chain(std::iter::once(ChannelCounter {
                name: config.unmatched_channel.clone(),
                discriminant: None,
                delivered: AtomicU64::new(0),
            }))
            .collect();

        Self {
            counters: Arc::new(counters),
        }
    }

    fn record(&self, slot: usize) {
        if let Some(counter) = self.counters.get(slot) {
            counter.delivered.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Snapshot of every channel in dispatch order.
    pub fn snapshot(&self) -> Vec<ChannelSnapshot> {
        self.counters
            .iter()
            .map(|c| ChannelSnapshot {
                name: c.name.clone(),
                discriminant: c.discriminant.clone(),
                delivered: c.delivered.load(Ordering::Relaxed),
            })
            .collect()
    }

    /// Total events delivered across all channels.
    pub fn total_delivered(&self) -> u64 {
        self.counters
            .iter()
            .map(|c| c.delivered.load(Ordering::Relaxed))
            .sum()
    }
}

#[derive(Debug)]
struct Output {
    name: String,
    tx: mpsc::Sender<NotificationEvent>,
}

/// Classifier plus the K+1 output channels it dispatches to.
///
/// Slots `0..K` hold the known-value channels in allow-list order, slot `K`
/// holds the catch-all.
#[derive(Debug)]
pub struct RoutingTable {
    classifier: Classifier,
    outputs: Vec<Output>,
    stats: ChannelStats,
}

impl RoutingTable {
    /// Build the table and the receivers for each channel.
    ///
    /// The config must already be validated.
    pub fn build(config: &RoutingConfig) -> (Self, Vec<ChannelReceiver>) {
        let classifier = Classifier::from_config(config);
        let mut outputs = Vec::with_capacity(classifier.branch_count() + 1);
        let mut receivers = Vec::with_capacity(classifier.branch_count() + 1);

        for name in config.channel_names() {
            let (tx, rx) = mpsc::channel(config.channel_capacity);
            outputs.push(Output {
                name: name.clone(),
                tx,
            });
            receivers.push(ChannelReceiver { name, rx });
        }

        let table = Self {
            classifier,
            outputs,
            stats: ChannelStats::new(config),
        };
        (table, receivers)
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn stats(&self) -> ChannelStats {
        self.stats.clone()
    }

    fn slot(&self, branch: BranchId) -> usize {
        match branch {
            BranchId::Known(index) => index,
            BranchId::Unmatched => self.classifier.branch_count(),
        }
    }

    /// Name of the channel serving `branch`.
    pub fn channel_name(&self, branch: BranchId) -> &str {
        &self.outputs[self.slot(branch)].name
    }

    /// Classify `event` and hand it, unchanged, to exactly one channel.
    ///
    /// Waits for room on the target channel rather than dropping. Channels
    /// share one router, so a consumer that stops draining stalls dispatch
    /// to every channel; once the input stream then fills, ingress reports
    /// `ChannelFull`.
    pub async fn dispatch(&self, event: NotificationEvent) -> Result<BranchId, DispatchError> {
        let branch = self.classifier.classify_event(&event);
        let slot = self.slot(branch);
        let output = &self.outputs[slot];

        output
            .tx
            .send(event)
            .await
            .map_err(|_| DispatchError::ChannelClosed {
                channel: output.name.clone(),
            })?;

        self.stats.record(slot);
        Ok(branch)
    }
}
