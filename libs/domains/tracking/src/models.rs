use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::error::{TrackingError, TrackingResult};

/// Operating status of a vehicle
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VehicleStatus {
    Active,
    Inactive,
    Repair,
    Sold,
    Rented,
}

/// Fuel level reported with a tracking event
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FuelCondition {
    Empty,
    Low,
    Half,
    Full,
}

fn validate_object_id(value: &str) -> Result<(), ValidationError> {
    if ObjectId::parse_str(value).is_err() {
        let mut err = ValidationError::new("object_id");
        err.message = Some("must be a 24-digit hex ObjectId".into());
        return Err(err);
    }
    Ok(())
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Inbound message body published to the tracking queue.
///
/// Unknown fields are ignored. A non-numeric mileage or an unknown enum value
/// fails deserialization.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TrackingSubmission {
    #[validate(custom(function = "validate_object_id"))]
    pub vehicle_id: String,
    #[validate(length(min = 1, max = 256), custom(function = "validate_not_blank"))]
    pub location: String,
    #[validate(range(min = 0.0))]
    pub mileage: f64,
    pub status: VehicleStatus,
    pub fuel_condition: FuelCondition,
}

/// A validated submission, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrackingEvent {
    pub vehicle_id: ObjectId,
    pub location: String,
    pub mileage: f64,
    pub status: VehicleStatus,
    pub fuel_condition: FuelCondition,
}

impl TryFrom<TrackingSubmission> for NewTrackingEvent {
    type Error = TrackingError;

    fn try_from(submission: TrackingSubmission) -> TrackingResult<Self> {
        Ok(Self {
            vehicle_id: ObjectId::parse_str(&submission.vehicle_id)?,
            location: submission.location,
            mileage: submission.mileage,
            status: submission.status,
            fuel_condition: submission.fuel_condition,
        })
    }
}

/// Tracking event as stored in the `tracking` collection.
///
/// Written once and never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub vehicle_id: ObjectId,
    pub location: String,
    pub mileage: f64,
    pub status: VehicleStatus,
    pub fuel_condition: FuelCondition,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl TrackingEvent {
    /// Stamps `event` with the current time, truncated to the millisecond
    /// precision BSON dates keep.
    pub fn new(event: NewTrackingEvent) -> Self {
        Self::with_created_at(event, bson::DateTime::now().to_chrono())
    }

    pub fn with_created_at(event: NewTrackingEvent, created_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            vehicle_id: event.vehicle_id,
            location: event.location,
            mileage: event.mileage,
            status: event.status,
            fuel_condition: event.fuel_condition,
            created_at,
        }
    }
}

/// HTTP rendering of a [`TrackingEvent`]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackingEventResponse {
    /// 24-digit hex ObjectId
    pub id: String,
    /// 24-digit hex ObjectId
    pub vehicle_id: String,
    pub location: String,
    pub mileage: f64,
    pub status: VehicleStatus,
    pub fuel_condition: FuelCondition,
    pub created_at: DateTime<Utc>,
}

impl From<TrackingEvent> for TrackingEventResponse {
    fn from(event: TrackingEvent) -> Self {
        Self {
            id: event.id.map(|id| id.to_hex()).unwrap_or_default(),
            vehicle_id: event.vehicle_id.to_hex(),
            location: event.location,
            mileage: event.mileage,
            status: event.status,
            fuel_condition: event.fuel_condition,
            created_at: event.created_at,
        }
    }
}
