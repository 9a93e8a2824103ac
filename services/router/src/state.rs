//! Application state shared across request handlers.

use std::sync::Arc;

use fanout_events::DiscriminantField;

use crate::producer::IngressProducer;
use crate::routing::ChannelStats;

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    producer: IngressProducer,
    stats: ChannelStats,
    field: DiscriminantField,
}

impl AppState {
    /// Create a new application state.
    pub fn new(producer: IngressProducer, stats: ChannelStats, field: DiscriminantField) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                producer,
                stats,
                field,
            }),
        }
    }

    pub fn producer(&self) -> &IngressProducer {
        &self.inner.producer
    }

    pub fn stats(&self) -> &ChannelStats {
        &self.inner.stats
    }

    /// The discriminant field this deployment routes on.
    pub fn field(&self) -> DiscriminantField {
        self.inner.field
    }
}
