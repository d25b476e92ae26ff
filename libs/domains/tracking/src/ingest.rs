//! Queue ingestion of tracking submissions.

use async_trait::async_trait;
use messaging::{ProcessingError, Processor};
use tracing::debug;

use crate::error::TrackingError;
use crate::models::TrackingSubmission;
use crate::repository::TrackingRepository;
use crate::service::TrackingService;

/// Decodes each delivery as a [`TrackingSubmission`] and stores it.
///
/// Acknowledgment and forwarding are left to the worker running this
/// processor.
pub struct TrackingIngestor<R: TrackingRepository> {
    service: TrackingService<R>,
}

impl<R: TrackingRepository> TrackingIngestor<R> {
    pub fn new(service: TrackingService<R>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<R: TrackingRepository + 'static> Processor for TrackingIngestor<R> {
    async fn process(&self, payload: &[u8]) -> Result<(), ProcessingError> {
        let submission: TrackingSubmission =
            serde_json::from_slice(payload).map_err(TrackingError::from)?;

        let event = self.service.track(submission).await?;
        debug!(id = ?event.id, vehicle_id = %event.vehicle_id, "Tracking event ingested");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "tracking"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrackingEvent;
    use crate::repository::MockTrackingRepository;
    use bson::oid::ObjectId;
    use messaging::memory::{MemoryPublisher, MemoryQueue, Settlement};
    use messaging::{IngestWorker, WorkerConfig};
    use tokio::sync::watch;

    const VALID: &str = r#"{"vehicle_id":"65a1f0c2e4b0a1b2c3d4e5f6","location":"Naypyidaw","mileage":880.25,"status":"inactive","fuel_condition":"low"}"#;

    fn storing_repo(times: usize) -> MockTrackingRepository {
        let mut repo = MockTrackingRepository::new();
        repo.expect_create().times(times).returning(|event| {
            let mut stored = TrackingEvent::new(event);
            stored.id = Some(ObjectId::new());
            Ok(stored)
        });
        repo
    }

    fn worker(
        repo: MockTrackingRepository,
        publisher: MemoryPublisher,
    ) -> IngestWorker<TrackingIngestor<MockTrackingRepository>, MemoryPublisher> {
        IngestWorker::new(
            TrackingIngestor::new(TrackingService::new(repo)),
            publisher,
            WorkerConfig::new("tracking", "vehicle").with_max_in_flight(4),
        )
    }

    #[tokio::test]
    async fn undecodable_payload_is_a_decode_error() {
        let mut repo = MockTrackingRepository::new();
        repo.expect_create().never();
        let ingestor = TrackingIngestor::new(TrackingService::new(repo));

        let err = ingestor.process(b"{\"vehicle_id\":").await.unwrap_err();
        assert_eq!(err.reason(), "decode");

        let err = ingestor
            .process(br#"{"vehicle_id":"65a1f0c2e4b0a1b2c3d4e5f6","location":"x","mileage":"many","status":"active","fuel_condition":"low"}"#)
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "decode");
    }

    #[tokio::test]
    async fn invalid_submission_is_rejected() {
        let mut repo = MockTrackingRepository::new();
        repo.expect_create().never();
        let ingestor = TrackingIngestor::new(TrackingService::new(repo));

        let err = ingestor
            .process(br#"{"vehicle_id":"nope","location":"x","mileage":1,"status":"active","fuel_condition":"low"}"#)
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "rejected");
    }

    #[tokio::test]
    async fn malformed_message_is_terminated_without_side_effects() {
        let mut repo = MockTrackingRepository::new();
        repo.expect_create().never();
        let queue = MemoryQueue::new();
        let publisher = MemoryPublisher::new();
        let (_tx, rx) = watch::channel(false);

        let report = worker(repo, publisher.clone())
            .run(queue.stream(["not json at all"]), rx)
            .await;

        assert_eq!(queue.settlements(), vec![(1, Settlement::Rejected)]);
        assert!(publisher.published().is_empty());
        assert_eq!(report.rejected, 1);
        assert_eq!(report.forwarded, 0);
    }

    #[tokio::test]
    async fn valid_message_is_stored_forwarded_and_acked() {
        let queue = MemoryQueue::new();
        let publisher = MemoryPublisher::new();
        let (_tx, rx) = watch::channel(false);

        let report = worker(storing_repo(1), publisher.clone())
            .run(queue.stream([VALID]), rx)
            .await;

        assert_eq!(queue.settlements(), vec![(1, Settlement::Acked)]);
        assert_eq!(
            publisher.published(),
            vec![("vehicle".to_string(), VALID.as_bytes().to_vec())]
        );
        assert_eq!(report.acked, 1);
        assert_eq!(report.forwarded, 1);
    }

    #[tokio::test]
    async fn one_bad_message_does_not_affect_the_rest() {
        let queue = MemoryQueue::new();
        let publisher = MemoryPublisher::new();
        let (_tx, rx) = watch::channel(false);

        let report = worker(storing_repo(2), publisher.clone())
            .run(queue.stream([VALID, "{", VALID]), rx)
            .await;

        assert_eq!(report.received, 3);
        assert_eq!(queue.count(Settlement::Acked), 2);
        assert_eq!(queue.count(Settlement::Rejected), 1);
        assert_eq!(publisher.published().len(), 2);
    }

    #[tokio::test]
    async fn storage_failure_rejects_the_delivery() {
        let mut repo = MockTrackingRepository::new();
        repo.expect_create()
            .returning(|_| Err(TrackingError::Database("not primary".into())));
        let queue = MemoryQueue::new();
        let publisher = MemoryPublisher::new();
        let (_tx, rx) = watch::channel(false);

        worker(repo, publisher.clone())
            .run(queue.stream([VALID]), rx)
            .await;

        assert_eq!(queue.settlements(), vec![(1, Settlement::Rejected)]);
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn forward_failure_keeps_the_ack() {
        let queue = MemoryQueue::new();
        let (_tx, rx) = watch::channel(false);

        let report = worker(storing_repo(1), MemoryPublisher::failing())
            .run(queue.stream([VALID]), rx)
            .await;

        assert_eq!(queue.settlements(), vec![(1, Settlement::Acked)]);
        assert_eq!(report.forward_failed, 1);
    }
}
