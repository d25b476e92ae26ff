use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::metrics::IngestMetrics;
use crate::publisher::Publisher;

/// Republishes processed payloads to a downstream queue, best effort.
///
/// Each forward runs on its own task in the worker's tracker, so the inbound
/// delivery can be acked without waiting for it. A failed publish is logged
/// and counted. It is not retried and never surfaces to the inbound
/// acknowledgment.
pub struct BestEffortForwarder<P: Publisher> {
    publisher: Arc<P>,
    destination: Arc<str>,
    metrics: IngestMetrics,
    forwarded: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
}

impl<P: Publisher> BestEffortForwarder<P> {
    pub fn new(publisher: P, destination: &str, metrics: IngestMetrics) -> Self {
        Self {
            publisher: Arc::new(publisher),
            destination: Arc::from(destination),
            metrics,
            forwarded: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Spawns the publish of `payload` onto `tracker` and returns immediately.
    pub fn forward(&self, tracker: &TaskTracker, delivery_id: String, payload: Vec<u8>) {
        let publisher = self.publisher.clone();
        let destination = self.destination.clone();
        let metrics = self.metrics.clone();
        let forwarded = self.forwarded.clone();
        let failed = self.failed.clone();

        tracker.spawn(async move {
            match publisher.publish(&destination, payload).await {
                Ok(()) => {
                    forwarded.fetch_add(1, Ordering::Relaxed);
                    debug!(delivery = %delivery_id, destination = %destination, "Forwarded payload");
                }
                Err(e) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    metrics.republish_failed(&destination);
                    warn!(
                        delivery = %delivery_id,
                        destination = %destination,
                        error = %e,
                        "Forward failed, inbound delivery stays acknowledged"
                    );
                }
            }
        });
    }

    /// (forwarded, failed) so far
    pub fn counts(&self) -> (u64, u64) {
        (
            self.forwarded.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        )
    }
}
