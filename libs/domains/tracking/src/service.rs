//! Tracking Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::error::{TrackingError, TrackingResult};
use crate::filter::TrackingFilter;
use crate::models::{NewTrackingEvent, TrackingEvent, TrackingSubmission};
use crate::repository::TrackingRepository;

/// Entry point shared by the ingestion worker and the HTTP handlers.
pub struct TrackingService<R: TrackingRepository> {
    repository: Arc<R>,
}

impl<R: TrackingRepository> TrackingService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Validates a submission and persists it as a new event.
    #[instrument(skip(self, submission), fields(vehicle_id = %submission.vehicle_id))]
    pub async fn track(&self, submission: TrackingSubmission) -> TrackingResult<TrackingEvent> {
        submission
            .validate()
            .map_err(|e| TrackingError::Validation(e.to_string()))?;

        let event = NewTrackingEvent::try_from(submission)?;
        self.repository.create(event).await
    }

    /// Builds a filter from raw query pairs and runs it.
    #[instrument(skip(self, params))]
    pub async fn query<'a, I>(&self, params: I) -> TrackingResult<Vec<TrackingEvent>>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let filter = TrackingFilter::from_params(params)?;
        self.find(filter).await
    }

    #[instrument(skip(self))]
    pub async fn find(&self, filter: TrackingFilter) -> TrackingResult<Vec<TrackingEvent>> {
        self.repository.find(filter).await
    }
}

impl<R: TrackingRepository> Clone for TrackingService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
