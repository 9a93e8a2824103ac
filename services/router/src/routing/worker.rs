//! Background router worker.
//!
//! Consumes the keyed stream one record at a time, in arrival order:
//! 1. Classify the record's event by its discriminant
//! 2. Forward the event unchanged to the matching output channel
//! 3. Repeat until the stream closes or shutdown is signalled
//!
//! On shutdown the stream is closed to new records and whatever is already
//! buffered is still routed before the worker exits. Dropping the worker
//! drops the channel senders, which lets each consumer drain and stop.

use fanout_events::KeyedRecord;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

use super::{RoutingTable, INPUT_STREAM_NAME};

pub struct RouterWorker {
    input: mpsc::Receiver<KeyedRecord>,
    table: RoutingTable,
}

impl RouterWorker {
    pub fn new(input: mpsc::Receiver<KeyedRecord>, table: RoutingTable) -> Self {
        Self { input, table }
    }

    /// Run until the stream closes or `shutdown` flips to true.
    #[instrument(skip(self, shutdown), name = "router_worker")]
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            input = INPUT_STREAM_NAME,
            field = %self.table.classifier().field(),
            known_values = ?self.table.classifier().known_values(),
            "Starting router worker"
        );

        loop {
            if *shutdown.borrow() {
                info!("Shutdown signal received, draining stream");
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown signal received, draining stream");
                        break;
                    }
                }
                record = self.input.recv() => {
                    match record {
                        Some(record) => self.route(record).await,
                        None => {
                            info!(
                                delivered = self.table.stats().total_delivered(),
                                "Input stream closed, stopping router worker"
                            );
                            return;
                        }
                    }
                }
            }
        }

        self.input.close();
        while let Some(record) = self.input.recv().await {
            self.route(record).await;
        }

        info!(
            delivered = self.table.stats().total_delivered(),
            "Router worker stopped"
        );
    }

    async fn route(&self, record: KeyedRecord) {
        let key = record.key().to_string();
        let event_id = record.event().id();

        match self.table.dispatch(record.into_event()).await {
            Ok(branch) => {
                debug!(
                    key = %key,
                    event_id = event_id,
                    channel = self.table.channel_name(branch),
                    "Routed event"
                );
            }
            Err(e) => {
                warn!(key = %key, event_id = event_id, error = %e, "Failed to route event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::RoutingConfig;
    use fanout_events::{NotificationEvent, DEFAULT_KEY_PREFIX};

    fn record(id: i64, app: &str) -> KeyedRecord {
        let event = NotificationEvent::builder()
            .id(id)
            .app(app)
            .action("object.updated")
            .build()
            .unwrap();
        KeyedRecord::new(DEFAULT_KEY_PREFIX, event)
    }

    #[tokio::test]
    async fn test_worker_stops_when_stream_closes() {
        let (table, mut receivers) = RoutingTable::build(&RoutingConfig::default());
        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        tx.send(record(1, "app1")).await.unwrap();
        tx.send(record(2, "nope")).await.unwrap();
        drop(tx);

        RouterWorker::new(rx, table).run(shutdown_rx).await;

        assert_eq!(receivers[0].rx.recv().await.unwrap().id(), 1);
        assert_eq!(receivers[3].rx.recv().await.unwrap().id(), 2);
        // Senders are gone once the worker returns.
        assert!(receivers[0].rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_worker_drains_buffer_on_shutdown() {
        let (table, mut receivers) = RoutingTable::build(&RoutingConfig::default());
        let (tx, rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tx.send(record(5, "app1")).await.unwrap();
        tx.send(record(6, "app1")).await.unwrap();
        shutdown_tx.send(true).unwrap();

        RouterWorker::new(rx, table).run(shutdown_rx).await;

        assert_eq!(receivers[0].rx.recv().await.unwrap().id(), 5);
        assert_eq!(receivers[0].rx.recv().await.unwrap().id(), 6);
        assert!(tx.send(record(7, "app1")).await.is_err());
    }
}
