//! Starts the queue ingestion worker.

use core_config::broker::BrokerConfig;
use domain_tracking::{MongoTrackingRepository, TrackingIngestor, TrackingService};
use eyre::WrapErr;
use messaging::nats::{self, JetStreamPublisher, QueueConsumer, RetentionPolicy};
use messaging::{IngestWorker, WorkerConfig, WorkerReport};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// Connects to the broker, declares both queues and spawns the worker.
///
/// The worker stops pulling when `shutdown` flips and resolves with its
/// report once drained.
pub async fn start(
    broker: &BrokerConfig,
    client_name: &str,
    service: TrackingService<MongoTrackingRepository>,
    shutdown: watch::Receiver<bool>,
) -> eyre::Result<JoinHandle<WorkerReport>> {
    let jetstream = nats::connect(&broker.url, client_name)
        .await
        .wrap_err("Failed to connect to NATS")?;

    nats::declare_queue(&jetstream, &broker.outbound_queue, RetentionPolicy::Limits)
        .await
        .wrap_err_with(|| format!("Failed to declare queue '{}'", broker.outbound_queue))?;

    let deliveries = QueueConsumer::new(
        jetstream.clone(),
        broker.inbound_queue.as_str(),
        broker.consumer_name.as_str(),
    )
    .with_ack_wait(broker.ack_wait)
    .with_max_in_flight(broker.max_in_flight)
    .deliveries()
    .await
    .wrap_err_with(|| format!("Failed to consume queue '{}'", broker.inbound_queue))?;

    let worker = IngestWorker::new(
        TrackingIngestor::new(service),
        JetStreamPublisher::new(jetstream),
        WorkerConfig::new(broker.inbound_queue.as_str(), broker.outbound_queue.as_str())
            .with_max_in_flight(broker.max_in_flight)
            .with_drain_timeout(broker.drain_timeout),
    );

    Ok(tokio::spawn(async move {
        let report = worker.run(deliveries, shutdown).await;
        info!(?report, "Ingest worker finished");
        report
    }))
}
