//! Fanout routing.
//!
//! Events arrive on a single keyed stream and leave on exactly one of
//! K+1 output channels:
//! - one channel per known discriminant value, in configured order
//! - one catch-all channel for everything else
//!
//! Classification is a pure function of the discriminant (see
//! [`Classifier`]); the [`RoutingTable`] maps each branch to its channel
//! and the [`RouterWorker`] drives the stream through it.

mod classifier;
mod table;
pub mod worker;

use std::collections::HashSet;

use fanout_events::{DiscriminantField, DEFAULT_KEY_PREFIX};
use thiserror::Error;

pub use classifier::{BranchId, Classifier};
pub use table::{ChannelReceiver, ChannelSnapshot, ChannelStats, DispatchError, RoutingTable};
pub use worker::RouterWorker;

/// Name of the inbound stream, used in logs.
pub const INPUT_STREAM_NAME: &str = "notification_topic";

/// Default name of the catch-all channel.
pub const DEFAULT_UNMATCHED_CHANNEL: &str = "unknown_topic";

/// Default capacity of the inbound stream.
pub const DEFAULT_STREAM_CAPACITY: usize = 256;

/// Default capacity of each output channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Channel name for a known discriminant value.
pub fn channel_name_for(value: &str) -> String {
    format!("{value}_topic")
}

/// Errors rejecting a routing configuration at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingConfigError {
    #[error("at least one known discriminant value is required")]
    NoKnownValues,

    #[error("known discriminant values must not be blank")]
    BlankValue,

    #[error("duplicate known discriminant value: {0}")]
    DuplicateValue(String),

    #[error("duplicate channel name: {0}")]
    DuplicateChannel(String),

    #[error("{0} capacity must be greater than zero")]
    ZeroCapacity(&'static str),
}

/// Static routing configuration.
///
/// Fixed for the lifetime of a pipeline; nothing reconfigures it at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingConfig {
    /// Which event field is the discriminant.
    pub field: DiscriminantField,

    /// Allow-list of known discriminant values, in branch order.
    pub known_values: Vec<String>,

    /// Name of the catch-all channel.
    pub unmatched_channel: String,

    /// Prefix for stream partition keys.
    pub key_prefix: String,

    /// Bound on records buffered between producer and router.
    pub stream_capacity: usize,

    /// Bound on events buffered per output channel.
    pub channel_capacity: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self::for_field(DiscriminantField::App)
    }
}

impl RoutingConfig {
    /// Defaults for routing on `field`.
    pub fn for_field(field: DiscriminantField) -> Self {
        Self {
            field,
            known_values: field.default_known_values(),
            unmatched_channel: DEFAULT_UNMATCHED_CHANNEL.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            stream_capacity: DEFAULT_STREAM_CAPACITY,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_known_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_stream_capacity(mut self, capacity: usize) -> Self {
        self.stream_capacity = capacity;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Channel names in dispatch order: known values first, catch-all last.
    pub fn channel_names(&self) -> Vec<String> {
        self.known_values
            .iter()
            .map(|v| channel_name_for(v))
            .chain(std::iter::once(self.unmatched_channel.clone()))
            .collect()
    }

    /// Check the configuration can build a routing table.
    pub fn validate(&self) -> Result<(), RoutingConfigError> {
        if self.known_values.is_empty() {
            return Err(RoutingConfigError::NoKnownValues);
        }

        let mut seen = HashSet::new();
        for value in &self.known_values {
            if value.trim().is_empty() {
                return Err(RoutingConfigError::BlankValue);
            }
            if !seen.insert(value.as_str()) {
                return Err(RoutingConfigError::DuplicateValue(value.clone()));
            }
        }

        let mut names = HashSet::new();
        for name in self.channel_names() {
            if name.trim().is_empty() {
                return Err(RoutingConfigError::BlankValue);
            }
            if !names.insert(name.clone()) {
                return Err(RoutingConfigError::DuplicateChannel(name));
            }
        }

        if self.stream_capacity == 0 {
            return Err(RoutingConfigError::ZeroCapacity("stream"));
        }
        if self.channel_capacity == 0 {
            return Err(RoutingConfigError::ZeroCapacity("channel"));
        }

        Ok(())
    }
}
