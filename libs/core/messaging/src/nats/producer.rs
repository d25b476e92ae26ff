//! Publishing to a queue's stream.

use async_nats::jetstream::Context;
use async_nats::HeaderMap;
use async_trait::async_trait;
use tracing::debug;

use crate::error::MessagingError;
use crate::publisher::Publisher;

/// Publishes to the subject named by the destination and waits for the
/// stream's ack.
#[derive(Clone)]
pub struct JetStreamPublisher {
    jetstream: Context,
}

impl JetStreamPublisher {
    pub fn new(jetstream: Context) -> Self {
        Self { jetstream }
    }
}

#[async_trait]
impl Publisher for JetStreamPublisher {
    async fn publish(&self, destination: &str, payload: Vec<u8>) -> Result<(), MessagingError> {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", "application/json");

        let ack = self
            .jetstream
            .publish_with_headers(destination.to_string(), headers, payload.into())
            .await
            .map_err(MessagingError::publish_error)?
            .await
            .map_err(MessagingError::publish_error)?;

        debug!(
            subject = %destination,
            stream = %ack.stream,
            sequence = ack.sequence,
            "Published"
        );
        Ok(())
    }
}
