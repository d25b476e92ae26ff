//! Bounded-concurrency ingestion worker.
//!
//! Pulls deliveries only while a concurrency slot is free, runs the
//! processor for each on its own task, and settles the delivery from the
//! outcome. Shutdown stops pulling and waits a bounded time for tasks
//! already running.

use futures::{Stream, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Semaphore};
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::config::WorkerConfig;
use crate::delivery::Delivery;
use crate::error::MessagingError;
use crate::forward::BestEffortForwarder;
use crate::metrics::IngestMetrics;
use crate::processor::Processor;
use crate::publisher::Publisher;

/// Counters for one [`IngestWorker::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub received: u64,
    pub acked: u64,
    pub rejected: u64,
    pub forwarded: u64,
    pub forward_failed: u64,
    /// Tasks still running when the drain timeout elapsed
    pub abandoned: usize,
}

#[derive(Default)]
struct Stats {
    received: AtomicU64,
    acked: AtomicU64,
    rejected: AtomicU64,
}

struct Shared<P: Processor, Pub: Publisher> {
    processor: P,
    forwarder: BestEffortForwarder<Pub>,
    metrics: IngestMetrics,
    stats: Stats,
}

/// Consumes a delivery stream with a [`Processor`] and forwards what it
/// accepts through a [`Publisher`].
pub struct IngestWorker<P: Processor, Pub: Publisher> {
    shared: Arc<Shared<P, Pub>>,
    config: WorkerConfig,
}

impl<P: Processor, Pub: Publisher> IngestWorker<P, Pub> {
    pub fn new(processor: P, publisher: Pub, config: WorkerConfig) -> Self {
        let metrics = IngestMetrics::new(&config.source, processor.name());
        let forwarder = BestEffortForwarder::new(publisher, &config.destination, metrics.clone());

        Self {
            shared: Arc::new(Shared {
                processor,
                forwarder,
                metrics,
                stats: Stats::default(),
            }),
            config,
        }
    }

    /// Runs until `shutdown` flips to `true` (or its sender is dropped) or the
    /// delivery stream ends, then drains in-flight work.
    pub async fn run<S, D>(&self, mut deliveries: S, mut shutdown: watch::Receiver<bool>) -> WorkerReport
    where
        S: Stream<Item = Result<D, MessagingError>> + Send + Unpin,
        D: Delivery,
    {
        let max_in_flight = self.config.max_in_flight.max(1);
        let semaphore = Arc::new(Semaphore::new(max_in_flight));
        let tracker = TaskTracker::new();

        info!(
            source = %self.config.source,
            destination = %self.config.destination,
            processor = self.shared.processor.name(),
            max_in_flight,
            "Starting ingest worker"
        );

        loop {
            let permit = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => {
                    info!("Shutdown signal received, no longer pulling deliveries");
                    break;
                }
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let next = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => {
                    info!("Shutdown signal received, no longer pulling deliveries");
                    break;
                }
                next = deliveries.next() => next,
            };

            match next {
                Some(Ok(delivery)) => {
                    let shared = self.shared.clone();
                    let task_tracker = tracker.clone();
                    let semaphore = semaphore.clone();

                    shared.stats.received.fetch_add(1, Ordering::Relaxed);
                    shared.metrics.delivery_received();
                    shared
                        .metrics
                        .in_flight(max_in_flight - semaphore.available_permits());

                    tracker.spawn(async move {
                        handle_delivery(&shared, &task_tracker, delivery).await;
                        drop(permit);
                        shared
                            .metrics
                            .in_flight(max_in_flight - semaphore.available_permits());
                    });
                }
                Some(Err(e)) => {
                    drop(permit);
                    error!(error = %e, source = %self.config.source, "Delivery stream error");
                    self.shared.metrics.stream_error();

                    tokio::select! {
                        biased;
                        _ = shutdown_requested(&mut shutdown) => break,
                        _ = tokio::time::sleep(self.config.error_backoff) => {}
                    }
                }
                None => {
                    info!(source = %self.config.source, "Delivery stream ended");
                    break;
                }
            }
        }

        drop(deliveries);
        let abandoned = self.drain(&tracker).await;
        self.report(abandoned)
    }

    async fn drain(&self, tracker: &TaskTracker) -> usize {
        tracker.close();
        let pending = tracker.len();
        if pending > 0 {
            info!(pending, timeout = ?self.config.drain_timeout, "Draining in-flight deliveries");
        }

        match tokio::time::timeout(self.config.drain_timeout, tracker.wait()).await {
            Ok(()) => {
                info!("Ingest worker stopped");
                0
            }
            Err(_) => {
                let abandoned = tracker.len();
                warn!(
                    abandoned,
                    "Drain timeout elapsed, unsettled deliveries will be redelivered"
                );
                abandoned
            }
        }
    }

    fn report(&self, abandoned: usize) -> WorkerReport {
        let stats = &self.shared.stats;
        let (forwarded, forward_failed) = self.shared.forwarder.counts();
        WorkerReport {
            received: stats.received.load(Ordering::Relaxed),
            acked: stats.acked.load(Ordering::Relaxed),
            rejected: stats.rejected.load(Ordering::Relaxed),
            forwarded,
            forward_failed,
            abandoned,
        }
    }
}

/// Resolves once shutdown is requested or the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

async fn handle_delivery<P, Pub, D>(shared: &Shared<P, Pub>, tracker: &TaskTracker, delivery: D)
where
    P: Processor,
    Pub: Publisher,
    D: Delivery,
{
    let id = delivery.id();
    let start = Instant::now();

    match shared.processor.process(delivery.payload()).await {
        Ok(()) => {
            shared
                .forwarder
                .forward(tracker, id.clone(), delivery.payload().to_vec());

            match delivery.ack().await {
                Ok(()) => {
                    shared.stats.acked.fetch_add(1, Ordering::Relaxed);
                    shared.metrics.delivery_acked(start.elapsed());
                    debug!(delivery = %id, duration_ms = start.elapsed().as_millis(), "Delivery acked");
                }
                Err(e) => {
                    error!(delivery = %id, error = %e, "Failed to ack delivery");
                }
            }
        }
        Err(e) => {
            warn!(
                delivery = %id,
                reason = e.reason(),
                error = %e,
                "Delivery rejected without requeue"
            );
            shared.metrics.delivery_rejected(e.reason(), start.elapsed());

            match delivery.reject().await {
                Ok(()) => {
                    shared.stats.rejected.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    error!(delivery = %id, error = %e, "Failed to reject delivery");
                }
            }
        }
    }
}
