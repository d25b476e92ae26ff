//! Tracking Domain
//!
//! Vehicle telemetry events: ingestion from a queue, persistence in MongoDB
//! and a filtered, paginated query endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐
//! │  Handlers   │   │ TrackingIngestor │  ← HTTP query / queue deliveries
//! └──────┬──────┘   └────────┬─────────┘
//!        │                   │
//! ┌──────▼───────────────────▼──────┐
//! │            Service              │  ← validation, filter building
//! └──────┬──────────────────────────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + MongoDB implementation)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Events, submissions, filter
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_tracking::{handlers, MongoTrackingRepository, TrackingIngestor, TrackingService};
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let repository = MongoTrackingRepository::new(&client.database("tracking"));
//! repository.ensure_indexes().await?;
//!
//! let service = TrackingService::new(repository);
//! let ingestor = TrackingIngestor::new(service.clone());
//! let router = handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod filter;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

pub use error::{TrackingError, TrackingResult};
pub use filter::{FilterError, SortField, SortOrder, TrackingFilter};
pub use handlers::ApiDoc;
pub use ingest::TrackingIngestor;
pub use models::{
    FuelCondition, NewTrackingEvent, TrackingEvent, TrackingEventResponse, TrackingSubmission,
    VehicleStatus,
};
pub use self::mongodb::MongoTrackingRepository;
pub use repository::TrackingRepository;
pub use service::TrackingService;
