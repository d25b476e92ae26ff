//! In-memory queue and publisher for exercising workers without a broker.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::delivery::Delivery;
use crate::error::MessagingError;
use crate::publisher::Publisher;

/// How a delivery was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Acked,
    Rejected,
}

/// Hands out [`MemoryDelivery`] values and records how each was settled.
#[derive(Clone, Default)]
pub struct MemoryQueue {
    next_id: Arc<AtomicU64>,
    settlements: Arc<Mutex<Vec<(u64, Settlement)>>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivery(&self, payload: impl Into<Vec<u8>>) -> MemoryDelivery {
        MemoryDelivery {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            payload: payload.into(),
            settlements: self.settlements.clone(),
        }
    }

    /// A finite delivery stream over `payloads`, in order.
    pub fn stream<I, B>(&self, payloads: I) -> BoxStream<'static, Result<MemoryDelivery, MessagingError>>
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        let deliveries: Vec<_> = payloads
            .into_iter()
            .map(|payload| Ok(self.delivery(payload)))
            .collect();
        stream::iter(deliveries).boxed()
    }

    /// Settlements in the order they happened, keyed by delivery id (1-based).
    pub fn settlements(&self) -> Vec<(u64, Settlement)> {
        self.settlements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, kind: Settlement) -> usize {
        self.settlements().iter().filter(|(_, s)| *s == kind).count()
    }
}

/// Delivery produced by [`MemoryQueue`].
pub struct MemoryDelivery {
    id: u64,
    payload: Vec<u8>,
    settlements: Arc<Mutex<Vec<(u64, Settlement)>>>,
}

impl MemoryDelivery {
    fn settle(&self, settlement: Settlement) {
        self.settlements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((self.id, settlement));
    }
}

#[async_trait]
impl Delivery for MemoryDelivery {
    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn id(&self) -> String {
        self.id.to_string()
    }

    async fn ack(&self) -> Result<(), MessagingError> {
        self.settle(Settlement::Acked);
        Ok(())
    }

    async fn reject(&self) -> Result<(), MessagingError> {
        self.settle(Settlement::Rejected);
        Ok(())
    }
}

/// Publisher that records every message, or fails every publish.
#[derive(Clone, Default)]
pub struct MemoryPublisher {
    published: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    failing: bool,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every publish returns `MessagingError::Publish`.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// (destination, payload) pairs in publish order
    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Publisher for MemoryPublisher {
    async fn publish(&self, destination: &str, payload: Vec<u8>) -> Result<(), MessagingError> {
        if self.failing {
            return Err(MessagingError::publish_error("publisher unavailable"));
        }
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((destination.to_string(), payload));
        Ok(())
    }
}
