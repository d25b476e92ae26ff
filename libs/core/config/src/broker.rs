//! Message broker settings for the ingestion pipeline.

use crate::{env_or_default, env_parse, env_required, ConfigError, FromEnv};
use std::time::Duration;

/// Broker connection and queue settings.
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    /// NATS server URL
    pub url: String,
    /// Queue the ingestion worker consumes from
    pub inbound_queue: String,
    /// Queue accepted events are forwarded to
    pub outbound_queue: String,
    /// Durable consumer name, shared by all replicas
    pub consumer_name: String,
    /// Upper bound on deliveries being handled at once
    pub max_in_flight: usize,
    /// How long shutdown waits for in-flight deliveries
    pub drain_timeout: Duration,
    /// Redelivery deadline for unacknowledged deliveries
    pub ack_wait: Duration,
}

impl BrokerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: "nats://127.0.0.1:4222".to_string(),
            inbound_queue: "tracking".to_string(),
            outbound_queue: "vehicle".to_string(),
            consumer_name: "tracking-svc".to_string(),
            max_in_flight: 64,
            drain_timeout: Duration::from_secs(10),
            ack_wait: Duration::from_secs(30),
        }
    }
}

impl FromEnv for BrokerConfig {
    /// - `NATS_URL` (required)
    /// - `TRACKING_QUEUE` (default "tracking")
    /// - `VEHICLE_QUEUE` (default "vehicle")
    /// - `INGEST_CONSUMER_NAME` (default "tracking-svc")
    /// - `INGEST_MAX_IN_FLIGHT` (default 64, must be positive)
    /// - `INGEST_DRAIN_TIMEOUT_SECS` (default 10)
    /// - `INGEST_ACK_WAIT_SECS` (default 30)
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let url = env_required("NATS_URL")?;
        let inbound_queue = env_or_default("TRACKING_QUEUE", &defaults.inbound_queue);
        let outbound_queue = env_or_default("VEHICLE_QUEUE", &defaults.outbound_queue);
        let consumer_name = env_or_default("INGEST_CONSUMER_NAME", &defaults.consumer_name);

        let max_in_flight = env_parse("INGEST_MAX_IN_FLIGHT", defaults.max_in_flight)?;
        if max_in_flight == 0 {
            return Err(ConfigError::InvalidValue {
                key: "INGEST_MAX_IN_FLIGHT".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        if inbound_queue == outbound_queue {
            return Err(ConfigError::InvalidValue {
                key: "VEHICLE_QUEUE".to_string(),
                details: format!("must differ from TRACKING_QUEUE ('{inbound_queue}')"),
            });
        }

        let drain_timeout = Duration::from_secs(env_parse("INGEST_DRAIN_TIMEOUT_SECS", 10u64)?);
        let ack_wait = Duration::from_secs(env_parse("INGEST_ACK_WAIT_SECS", 30u64)?);

        Ok(Self {
            url,
            inbound_queue,
            outbound_queue,
            consumer_name,
            max_in_flight,
            drain_timeout,
            ack_wait,
        })
    }
}
