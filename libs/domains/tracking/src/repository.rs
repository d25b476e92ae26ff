use async_trait::async_trait;

use crate::error::TrackingResult;
use crate::filter::TrackingFilter;
use crate::models::{NewTrackingEvent, TrackingEvent};

/// Storage for tracking events.
///
/// Events are append-only: there is no update or delete.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackingRepository: Send + Sync {
    /// Stamps the creation time, persists the event and returns it with the
    /// store-assigned id set.
    async fn create(&self, event: NewTrackingEvent) -> TrackingResult<TrackingEvent>;

    /// Events matching `filter`, sorted and paged. Empty when nothing matches.
    async fn find(&self, filter: TrackingFilter) -> TrackingResult<Vec<TrackingEvent>>;
}
