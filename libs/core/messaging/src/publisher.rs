use async_trait::async_trait;

use crate::error::MessagingError;

/// Publishes raw payloads to a named queue.
#[async_trait]
pub trait Publisher: Send + Sync + 'static {
    /// Publishes `payload` unchanged as a JSON message on `destination` and
    /// waits for the broker to confirm it was stored.
    async fn publish(&self, destination: &str, payload: Vec<u8>) -> Result<(), MessagingError>;
}
