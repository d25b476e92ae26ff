//! End-to-end ingestion through NATS JetStream into MongoDB (testcontainers).
//!
//! Run with `cargo test -p domain_tracking -- --ignored`.

use domain_tracking::*;
use messaging::nats::{self, JetStreamPublisher, QueueConsumer, RetentionPolicy};
use messaging::{IngestWorker, WorkerConfig};
use std::time::Duration;
use test_utils::{TestDataBuilder, TestMongo, TestNats};
use tokio::sync::watch;

const INBOUND: &str = "tracking";
const OUTBOUND: &str = "vehicle";

async fn wait_for_records(service: &TrackingService<MongoTrackingRepository>, expected: usize) {
    for _ in 0..50 {
        if service.find(TrackingFilter::default()).await.unwrap().len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("timed out waiting for {expected} tracking records");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_queue_to_store_to_outbound() {
    let nats = TestNats::new().await;
    let mongo = TestMongo::new().await;
    let jetstream = nats.jetstream();
    let builder = TestDataBuilder::from_test_name("queue_to_store");

    let repo = MongoTrackingRepository::new(&mongo.database());
    let service = TrackingService::new(repo);

    let mut outbound = nats::declare_queue(&jetstream, OUTBOUND, RetentionPolicy::Limits)
        .await
        .unwrap();
    let deliveries = QueueConsumer::new(jetstream.clone(), INBOUND, "tracking-test")
        .with_ack_wait(Duration::from_secs(2))
        .with_max_in_flight(4)
        .deliveries()
        .await
        .unwrap();

    let valid = format!(
        r#"{{"vehicle_id":"{}","location":"Yangon","mileage":321.0,"status":"active","fuel_condition":"full"}}"#,
        builder.object_id_hex(1)
    );
    for body in ["{not json", valid.as_str()] {
        jetstream
            .publish(INBOUND, body.to_string().into())
            .await
            .unwrap()
            .await
            .unwrap();
    }

    let worker = IngestWorker::new(
        TrackingIngestor::new(service.clone()),
        JetStreamPublisher::new(jetstream.clone()),
        WorkerConfig::new(INBOUND, OUTBOUND)
            .with_max_in_flight(4)
            .with_drain_timeout(Duration::from_secs(5)),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let running = tokio::spawn(async move { worker.run(deliveries, shutdown_rx).await });

    wait_for_records(&service, 1).await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    shutdown_tx.send_replace(true);
    let report = running.await.unwrap();

    assert_eq!(report.received, 2);
    assert_eq!(report.acked, 1);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.forwarded, 1);
    assert_eq!(report.abandoned, 0);

    let stored = service.find(TrackingFilter::default()).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].vehicle_id.to_hex(), builder.object_id_hex(1));

    let info = outbound.info().await.unwrap();
    assert_eq!(info.state.messages, 1);
    let forwarded = outbound
        .get_last_raw_message_by_subject(OUTBOUND)
        .await
        .unwrap();
    assert_eq!(forwarded.payload.as_ref(), valid.as_bytes());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_backlog_larger_than_cap_is_stored_once() {
    let nats = TestNats::new().await;
    let mongo = TestMongo::new().await;
    let jetstream = nats.jetstream();
    let builder = TestDataBuilder::from_test_name("backlog");

    let service = TrackingService::new(MongoTrackingRepository::new(&mongo.database()));
    nats::declare_queue(&jetstream, OUTBOUND, RetentionPolicy::Limits)
        .await
        .unwrap();
    let deliveries = QueueConsumer::new(jetstream.clone(), INBOUND, "tracking-backlog")
        .with_ack_wait(Duration::from_secs(1))
        .with_max_in_flight(2)
        .deliveries()
        .await
        .unwrap();

    for i in 0..20u32 {
        let body = format!(
            r#"{{"vehicle_id":"{}","location":"Bago","mileage":{i}.0,"status":"active","fuel_condition":"half"}}"#,
            builder.object_id_hex(i)
        );
        jetstream
            .publish(INBOUND, body.into())
            .await
            .unwrap()
            .await
            .unwrap();
    }

    let worker = IngestWorker::new(
        TrackingIngestor::new(service.clone()),
        JetStreamPublisher::new(jetstream.clone()),
        WorkerConfig::new(INBOUND, OUTBOUND)
            .with_max_in_flight(2)
            .with_drain_timeout(Duration::from_secs(5)),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let running = tokio::spawn(async move { worker.run(deliveries, shutdown_rx).await });

    wait_for_records(&service, 20).await;
    // Past ack_wait, so anything left unsettled would have come back.
    tokio::time::sleep(Duration::from_secs(2)).await;
    shutdown_tx.send_replace(true);
    let report = running.await.unwrap();

    assert_eq!(report.received, 20);
    assert_eq!(report.acked, 20);

    let stored = service
        .find(TrackingFilter::from_params([("limit", "100")]).unwrap())
        .await
        .unwrap();
    assert_eq!(stored.len(), 20);
}
