//! Worker configuration.

use std::time::Duration;

/// Settings for an [`IngestWorker`](crate::IngestWorker).
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Queue the deliveries come from, used as a log field and metric label
    pub source: String,

    /// Queue successfully processed payloads are forwarded to
    pub destination: String,

    /// Upper bound on deliveries being processed at once.
    /// The worker does not pull a delivery until a slot is free.
    pub max_in_flight: usize,

    /// How long shutdown waits for in-flight deliveries and forwards
    pub drain_timeout: Duration,

    /// Pause after the delivery stream yields an error
    pub error_backoff: Duration,
}

impl WorkerConfig {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            ..Default::default()
        }
    }

    /// Values below 1 are raised to 1.
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max.max(1);
        self
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            source: "inbound".to_string(),
            destination: "outbound".to_string(),
            max_in_flight: 64,
            drain_timeout: Duration::from_secs(10),
            error_backoff: Duration::from_millis(500),
        }
    }
}
