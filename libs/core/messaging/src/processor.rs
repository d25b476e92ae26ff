//! Processor trait for delivery handling.

use crate::error::ProcessingError;
use async_trait::async_trait;

/// Handles the payload of one delivery.
///
/// The processor only decides success or failure; settlement and forwarding
/// belong to the worker:
///
/// * `Ok(())` - payload is forwarded downstream, then the delivery is acked
/// * `Err(_)` - delivery is rejected without requeue
///
/// # Example
///
/// ```rust,ignore
/// struct AuditProcessor { store: Arc<AuditStore> }
///
/// #[async_trait]
/// impl Processor for AuditProcessor {
///     async fn process(&self, payload: &[u8]) -> Result<(), ProcessingError> {
///         let entry: AuditEntry = serde_json::from_slice(payload)
///             .map_err(|e| ProcessingError::decode(e.to_string()))?;
///         self.store.append(entry).await
///             .map_err(|e| ProcessingError::rejected(e.to_string()))
///     }
///
///     fn name(&self) -> &'static str {
///         "audit"
///     }
/// }
/// ```
#[async_trait]
pub trait Processor: Send + Sync + 'static {
    async fn process(&self, payload: &[u8]) -> Result<(), ProcessingError>;

    /// Used for log fields and metric labels.
    fn name(&self) -> &'static str;
}

/// Accepts every payload.
#[derive(Debug, Clone, Default)]
pub struct NoOpProcessor;

#[async_trait]
impl Processor for NoOpProcessor {
    async fn process(&self, _payload: &[u8]) -> Result<(), ProcessingError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_processor_accepts_anything() {
        let processor = NoOpProcessor;
        assert!(processor.process(b"\x00not json").await.is_ok());
        assert_eq!(processor.name(), "noop");
    }
}
