//! Prometheus metrics for the ingestion worker.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

use crate::error::MessagingError;

/// Metric recorder scoped to one queue and processor.
#[derive(Clone, Debug)]
pub struct IngestMetrics {
    queue: String,
    processor: String,
}

impl IngestMetrics {
    pub fn new(queue: &str, processor: &str) -> Self {
        Self {
            queue: queue.to_string(),
            processor: processor.to_string(),
        }
    }

    pub fn delivery_received(&self) {
        counter!(
            "ingest_deliveries_received_total",
            "queue" => self.queue.clone(),
            "processor" => self.processor.clone()
        )
        .increment(1);
    }

    pub fn delivery_acked(&self, duration: Duration) {
        counter!(
            "ingest_deliveries_acked_total",
            "queue" => self.queue.clone(),
            "processor" => self.processor.clone()
        )
        .increment(1);
        self.record_duration(duration);
    }

    pub fn delivery_rejected(&self, reason: &'static str, duration: Duration) {
        counter!(
            "ingest_deliveries_rejected_total",
            "queue" => self.queue.clone(),
            "processor" => self.processor.clone(),
            "reason" => reason
        )
        .increment(1);
        self.record_duration(duration);
    }

    pub fn republish_failed(&self, destination: &str) {
        counter!(
            "ingest_republish_failed_total",
            "queue" => self.queue.clone(),
            "destination" => destination.to_string()
        )
        .increment(1);
    }

    pub fn stream_error(&self) {
        counter!("ingest_stream_errors_total", "queue" => self.queue.clone()).increment(1);
    }

    pub fn in_flight(&self, count: usize) {
        gauge!("ingest_in_flight", "queue" => self.queue.clone()).set(count as f64);
    }

    fn record_duration(&self, duration: Duration) {
        histogram!(
            "ingest_delivery_duration_seconds",
            "queue" => self.queue.clone(),
            "processor" => self.processor.clone()
        )
        .record(duration.as_secs_f64());
    }
}

/// Installs the global Prometheus recorder and returns the render handle.
///
/// Fails if a recorder is already installed.
pub fn install_prometheus() -> Result<PrometheusHandle, MessagingError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MessagingError::Metrics(e.to_string()))
}
