//! Shared application state.

use domain_tracking::{MongoTrackingRepository, TrackingService};
use metrics_exporter_prometheus::PrometheusHandle;
use mongodb::Client;

/// Cloned into each router; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// Shares its connection pool with the tracking repository
    pub mongo_client: Client,
    pub tracking: TrackingService<MongoTrackingRepository>,
    pub metrics: PrometheusHandle,
}
