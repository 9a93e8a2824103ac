//! Producer → router → consumers, wired together.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::producer::IngressProducer;
use crate::routing::{ChannelStats, RouterWorker, RoutingConfig, RoutingConfigError, RoutingTable};
use crate::sinks::{ChannelConsumer, EventSink};

/// A running fanout pipeline.
///
/// The router task stops on shutdown or once every producer clone has been
/// dropped; consumers stop after their channel drains.
pub struct FanoutPipeline {
    producer: IngressProducer,
    stats: ChannelStats,
    router: JoinHandle<()>,
    consumers: Vec<JoinHandle<()>>,
}

impl FanoutPipeline {
    /// Validate `config` and spawn the router and one consumer per channel.
    ///
    /// Must be called within a tokio runtime.
    pub fn spawn(
        config: &RoutingConfig,
        sink: Arc<dyn EventSink>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self, RoutingConfigError> {
        config.validate()?;

        let (producer, input) =
            IngressProducer::channel(config.key_prefix.as_str(), config.stream_capacity);
        let (table, receivers) = RoutingTable::build(config);
        let stats = table.stats();

        let consumers = receivers
            .into_iter()
            .map(|receiver| {
                let consumer = ChannelConsumer::new(receiver, Arc::clone(&sink));
                tokio::spawn(consumer.run())
            })
            .collect::<Vec<_>>();

        let router = tokio::spawn(RouterWorker::new(input, table).run(shutdown));

        info!(
            field = %config.field,
            channels = ?config.channel_names(),
            stream_capacity = config.stream_capacity,
            "Fanout pipeline started"
        );

        Ok(Self {
            producer,
            stats,
            router,
            consumers,
        })
    }

    /// A handle for emitting events into the pipeline.
    pub fn producer(&self) -> IngressProducer {
        self.producer.clone()
    }

    pub fn stats(&self) -> ChannelStats {
        self.stats.clone()
    }

    /// Wait for the router and every consumer to finish.
    ///
    /// Drops this pipeline's own producer first; the router still waits for
    /// any outstanding clones (or shutdown) before it stops.
    pub async fn join(self) {
        let Self {
            producer,
            router,
            consumers,
            ..
        } = self;
        drop(producer);

        if let Err(e) = router.await {
            error!(error = %e, "Router task panicked");
        }
        for consumer in consumers {
            if let Err(e) = consumer.await {
                error!(error = %e, "Consumer task panicked");
            }
        }
    }
}
