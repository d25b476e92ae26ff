//! Queue consumption with explicit acknowledgment.
//!
//! The crate separates *how deliveries arrive* (a [`Delivery`] stream from a
//! broker backend) from *what is done with them* (a [`Processor`]). The
//! [`IngestWorker`] joins the two:
//!
//! ```text
//!  broker ──▶ Stream<Delivery> ──▶ IngestWorker ──▶ Processor::process(payload)
//!                                     │   │                 │
//!                                     │   │        Ok ──────┼──▶ forward payload (best effort)
//!                                     │   │                 │    then ack
//!                                     │   │        Err ─────┴──▶ reject (no requeue)
//!                                     │   └── Semaphore: at most `max_in_flight`
//!                                     └────── TaskTracker: bounded drain on shutdown
//! ```
//!
//! Delivery guarantees:
//! - **Inbound, at-least-once**: a delivery is acked only after its processor
//!   succeeded. Deliveries still running when the drain timeout elapses are
//!   never acked and come back from the broker.
//! - **Downstream, best-effort**: the forwarded copy is published on its own
//!   task. Its failure is logged and counted but never changes the inbound ack.
//!
//! The `nats` feature provides the NATS JetStream backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use messaging::{IngestWorker, WorkerConfig};
//! use messaging::nats::{JetStreamPublisher, QueueConsumer};
//!
//! let consumer = QueueConsumer::new(jetstream.clone(), "tracking", "tracking-svc");
//! let deliveries = consumer.deliveries().await?;
//!
//! let worker = IngestWorker::new(
//!     processor,
//!     JetStreamPublisher::new(jetstream),
//!     WorkerConfig::new("tracking", "vehicle").with_max_in_flight(64),
//! );
//! let report = worker.run(deliveries, shutdown_rx).await;
//! ```

mod config;
mod delivery;
mod error;
mod forward;
pub mod memory;
pub mod metrics;
mod processor;
mod publisher;
mod worker;

#[cfg(feature = "nats")]
pub mod nats;

pub use config::WorkerConfig;
pub use delivery::Delivery;
pub use error::{MessagingError, ProcessingError};
pub use forward::BestEffortForwarder;
pub use metrics::IngestMetrics;
pub use processor::{NoOpProcessor, Processor};
pub use publisher::Publisher;
pub use worker::{IngestWorker, WorkerReport};
