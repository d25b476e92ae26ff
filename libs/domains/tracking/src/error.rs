use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use messaging::ProcessingError;
use thiserror::Error;

use crate::filter::FilterError;

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid vehicle id: {0}")]
    InvalidVehicleId(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Malformed tracking payload: {0}")]
    Decode(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("No tracking data matched the query")]
    NoResults,
}

pub type TrackingResult<T> = Result<T, TrackingError>;

impl From<TrackingError> for AppError {
    fn from(err: TrackingError) -> Self {
        match err {
            TrackingError::Validation(msg) => AppError::BadRequest(msg),
            TrackingError::InvalidVehicleId(msg) => AppError::InvalidObjectId(msg),
            TrackingError::Filter(e @ FilterError::InvalidVehicleId(_)) => {
                AppError::InvalidObjectId(e.to_string())
            }
            TrackingError::Filter(e) => AppError::BadRequest(e.to_string()),
            TrackingError::Decode(msg) => AppError::BadRequest(msg),
            TrackingError::Database(msg) => AppError::Database(msg),
            TrackingError::NoResults => AppError::NotFound("not found".to_string()),
        }
    }
}

impl IntoResponse for TrackingError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

/// Every failure rejects the delivery. Only the label differs.
impl From<TrackingError> for ProcessingError {
    fn from(err: TrackingError) -> Self {
        match err {
            TrackingError::Decode(msg) => ProcessingError::decode(msg),
            other => ProcessingError::rejected(other.to_string()),
        }
    }
}

impl From<mongodb::error::Error> for TrackingError {
    fn from(err: mongodb::error::Error) -> Self {
        TrackingError::Database(err.to_string())
    }
}

impl From<bson::oid::Error> for TrackingError {
    fn from(err: bson::oid::Error) -> Self {
        TrackingError::InvalidVehicleId(err.to_string())
    }
}

impl From<serde_json::Error> for TrackingError {
    fn from(err: serde_json::Error) -> Self {
        TrackingError::Decode(err.to_string())
    }
}
