//! Durable pull consumer over a queue's stream.

use async_nats::jetstream::consumer::pull::Config as ConsumerConfig;
use async_nats::jetstream::consumer::AckPolicy;
use async_nats::jetstream::{AckKind, Context, Message};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use std::time::Duration;
use tracing::info;

use super::{declare_queue, stream_name_for, RetentionPolicy};
use crate::delivery::Delivery;
use crate::error::MessagingError;

/// Reads one queue through a durable consumer with explicit acks.
#[derive(Clone)]
pub struct QueueConsumer {
    jetstream: Context,
    queue: String,
    durable_name: String,
    ack_wait: Duration,
    max_in_flight: usize,
}

impl QueueConsumer {
    pub fn new(jetstream: Context, queue: impl Into<String>, durable_name: impl Into<String>) -> Self {
        Self {
            jetstream,
            queue: queue.into(),
            durable_name: durable_name.into(),
            ack_wait: Duration::from_secs(30),
            max_in_flight: 64,
        }
    }

    /// Caps unacknowledged messages on the server and the pull batch size.
    /// Should match the worker's `max_in_flight` so nothing waits in a client
    /// buffer while its ack timer runs. Values below 1 are raised to 1.
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max.max(1);
        self
    }

    /// How long the server waits for a settlement before redelivering.
    pub fn with_ack_wait(mut self, ack_wait: Duration) -> Self {
        self.ack_wait = ack_wait;
        self
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Declares the queue and its consumer, then returns the delivery stream.
    ///
    /// The server hands out at most `max_in_flight` unacknowledged messages,
    /// so a worker holding that many stops receiving until it settles one.
    pub async fn deliveries(
        &self,
    ) -> Result<BoxStream<'static, Result<JetStreamDelivery, MessagingError>>, MessagingError> {
        let stream = declare_queue(&self.jetstream, &self.queue, RetentionPolicy::WorkQueue).await?;

        let consumer = stream
            .get_or_create_consumer(
                &self.durable_name,
                consumer_config(&self.durable_name, &self.queue, self.ack_wait, self.max_in_flight),
            )
            .await
            .map_err(MessagingError::from_jetstream_error)?;

        info!(
            stream = %stream_name_for(&self.queue),
            consumer = %self.durable_name,
            ack_wait = ?self.ack_wait,
            max_in_flight = self.max_in_flight,
            "Consumer ready"
        );

        let messages = consumer
            .stream()
            .max_messages_per_batch(self.max_in_flight)
            .messages()
            .await
            .map_err(|e| MessagingError::Consumer(e.to_string()))?;

        Ok(messages
            .map(|message| {
                message
                    .map(JetStreamDelivery::new)
                    .map_err(|e| MessagingError::Consumer(e.to_string()))
            })
            .boxed())
    }
}

fn consumer_config(
    durable_name: &str,
    queue: &str,
    ack_wait: Duration,
    max_in_flight: usize,
) -> ConsumerConfig {
    ConsumerConfig {
        durable_name: Some(durable_name.to_string()),
        ack_policy: AckPolicy::Explicit,
        ack_wait,
        max_ack_pending: max_in_flight as i64,
        filter_subject: queue.to_string(),
        ..Default::default()
    }
}

/// A JetStream message awaiting settlement.
pub struct JetStreamDelivery {
    message: Message,
    id: String,
}

impl JetStreamDelivery {
    fn new(message: Message) -> Self {
        let id = message
            .info()
            .map(|info| info.stream_sequence.to_string())
            .unwrap_or_default();
        Self { message, id }
    }
}

#[async_trait]
impl Delivery for JetStreamDelivery {
    fn payload(&self) -> &[u8] {
        &self.message.payload
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    async fn ack(&self) -> Result<(), MessagingError> {
        self.message.ack().await.map_err(MessagingError::ack_error)
    }

    /// Terminates the message so the server never redelivers it.
    async fn reject(&self) -> Result<(), MessagingError> {
        self.message
            .ack_with(AckKind::Term)
            .await
            .map_err(MessagingError::ack_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_side_cap_follows_max_in_flight() {
        let config = consumer_config("tracking-svc", "tracking", Duration::from_secs(5), 8);

        assert_eq!(config.max_ack_pending, 8);
        assert_eq!(config.ack_wait, Duration::from_secs(5));
        assert_eq!(config.ack_policy, AckPolicy::Explicit);
        assert_eq!(config.filter_subject, "tracking");
        assert_eq!(config.durable_name.as_deref(), Some("tracking-svc"));
    }
}
