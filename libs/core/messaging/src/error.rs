//! Error types for queue plumbing and delivery processing.

use thiserror::Error;

/// Failure of a processor to handle one delivery.
///
/// Every variant is terminal for that delivery: the worker rejects it
/// without requeue. There is no retry category.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Payload could not be decoded into the expected message
    #[error("decode error: {0}")]
    Decode(String),

    /// Payload decoded but was refused (validation or storage failure)
    #[error("rejected: {0}")]
    Rejected(String),
}

impl ProcessingError {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// Short label used for logs and the `reason` metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            ProcessingError::Decode(_) => "decode",
            ProcessingError::Rejected(_) => "rejected",
        }
    }
}

/// Errors raised by broker backends.
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("JetStream error: {0}")]
    JetStream(String),

    #[error("consumer error: {0}")]
    Consumer(String),

    #[error("publish error: {0}")]
    Publish(String),

    #[error("acknowledgment error: {0}")]
    Ack(String),

    #[error("metrics error: {0}")]
    Metrics(String),
}

impl MessagingError {
    pub fn from_jetstream_error(error: impl std::fmt::Display) -> Self {
        Self::JetStream(error.to_string())
    }

    pub fn publish_error(error: impl std::fmt::Display) -> Self {
        Self::Publish(error.to_string())
    }

    pub fn ack_error(error: impl std::fmt::Display) -> Self {
        Self::Ack(error.to_string())
    }
}
