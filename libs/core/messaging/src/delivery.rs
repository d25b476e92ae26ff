use async_trait::async_trait;

use crate::error::MessagingError;

/// One message handed out by a queue, awaiting settlement.
///
/// Exactly one of [`ack`](Delivery::ack) or [`reject`](Delivery::reject) is
/// called per delivery by the worker. A delivery that is never settled is
/// redelivered by the broker once its ack deadline passes.
#[async_trait]
pub trait Delivery: Send + Sync + 'static {
    /// Raw message body
    fn payload(&self) -> &[u8];

    /// Broker-specific identifier for logs (stream sequence, delivery tag, ...)
    fn id(&self) -> String;

    /// Positive acknowledgment: the broker drops the message.
    async fn ack(&self) -> Result<(), MessagingError>;

    /// Negative acknowledgment without requeue: the broker drops the message
    /// and never redelivers it.
    async fn reject(&self) -> Result<(), MessagingError>;
}
