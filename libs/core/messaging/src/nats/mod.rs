//! NATS JetStream backend.
//!
//! Every queue maps to one stream with a single subject equal to the queue
//! name:
//!
//! ```text
//!  queue "tracking"  ──▶ stream TRACKING  (subject "tracking", work-queue retention)
//!  queue "vehicle"   ──▶ stream VEHICLE   (subject "vehicle", limits retention)
//! ```
//!
//! The inbound queue is read through a durable pull consumer with explicit
//! acks ([`QueueConsumer`]). Forwarded payloads go out through
//! [`JetStreamPublisher`].

mod consumer;
mod producer;

use async_nats::jetstream::stream::{Config as StreamConfig, Stream};
use async_nats::jetstream::Context;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::MessagingError;

pub use async_nats::jetstream::stream::RetentionPolicy;
pub use consumer::{JetStreamDelivery, QueueConsumer};
pub use producer::JetStreamPublisher;

/// Limits-retention streams keep messages this long.
const OUTBOUND_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Connects to NATS and returns a JetStream context.
pub async fn connect(url: &str, client_name: &str) -> Result<Context, MessagingError> {
    let client = async_nats::ConnectOptions::new()
        .name(client_name)
        .connect(url)
        .await
        .map_err(|e| MessagingError::Connection(e.to_string()))?;

    info!(client = client_name, "Connected to NATS");
    Ok(async_nats::jetstream::new(client))
}

/// Stream name for a queue: uppercased, with subject tokens and whitespace
/// replaced by `_`.
pub fn stream_name_for(queue: &str) -> String {
    queue
        .chars()
        .map(|c| match c {
            '.' | '*' | '>' => '_',
            c if c.is_whitespace() => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

/// Creates the stream backing `queue` if it does not exist yet.
pub async fn declare_queue(
    jetstream: &Context,
    queue: &str,
    retention: RetentionPolicy,
) -> Result<Stream, MessagingError> {
    let name = stream_name_for(queue);
    let max_age = match retention {
        RetentionPolicy::Limits => OUTBOUND_MAX_AGE,
        _ => Duration::ZERO,
    };

    let stream = jetstream
        .get_or_create_stream(StreamConfig {
            name: name.clone(),
            subjects: vec![queue.to_string()],
            retention,
            max_age,
            ..Default::default()
        })
        .await
        .map_err(MessagingError::from_jetstream_error)?;

    debug!(stream = %name, subject = %queue, ?retention, "Queue declared");
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_name_is_uppercased_queue() {
        assert_eq!(stream_name_for("tracking"), "TRACKING");
        assert_eq!(stream_name_for("vehicle"), "VEHICLE");
    }

    #[test]
    fn stream_name_replaces_subject_tokens() {
        assert_eq!(stream_name_for("fleet.tracking"), "FLEET_TRACKING");
        assert_eq!(stream_name_for("fleet.*.events >"), "FLEET___EVENTS__");
    }
}
