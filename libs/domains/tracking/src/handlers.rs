use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_helpers::{
    ApiResponse,
    errors::{
        handlers::method_not_allowed,
        responses::{
            BadRequestResponse, InternalServerErrorResponse, MethodNotAllowedResponse,
            NotFoundResponse,
        },
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{TrackingError, TrackingResult};
use crate::filter::FilterError;
use crate::models::{FuelCondition, TrackingEventResponse, VehicleStatus};
use crate::repository::TrackingRepository;
use crate::service::TrackingService;

pub const FETCHED_MESSAGE: &str = "successfully fetched tracking data";

/// OpenAPI documentation for the tracking API
#[derive(OpenApi)]
#[openapi(
    paths(find_tracking_data),
    components(
        schemas(TrackingEventResponse, VehicleStatus, FuelCondition),
        responses(
            BadRequestResponse,
            NotFoundResponse,
            MethodNotAllowedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Tracking", description = "Vehicle tracking data (MongoDB)")
    )
)]
pub struct ApiDoc;

/// Tracking routes, to be nested under the API version prefix.
pub fn router<R: TrackingRepository + 'static>(service: TrackingService<R>) -> Router {
    Router::new()
        .route(
            "/tracking-data",
            get(find_tracking_data)
                .head(get_only)
                .fallback(get_only),
        )
        .with_state(Arc::new(service))
}

/// 405 for every method but GET, including HEAD
async fn get_only() -> Response {
    ([(header::ALLOW, "GET")], method_not_allowed().await).into_response()
}

/// Query stored tracking events
///
/// Only the first value of a repeated parameter is used. Unknown parameters
/// are ignored.
#[utoipa::path(
    get,
    path = "/tracking-data",
    tag = "Tracking",
    params(
        ("page" = Option<u64>, Query, description = "Page number, from 1 (default 1)"),
        ("limit" = Option<u64>, Query, description = "Page size (default 10, at most 100)"),
        ("sort_by" = Option<String>, Query, description = "created_at (default), vehicle_id, location, mileage, status, fuel_condition or _id"),
        ("sort_order" = Option<String>, Query, description = "asc (default) or desc"),
        ("vehicle_id" = Option<String>, Query, description = "24-digit hex ObjectId"),
        ("location" = Option<String>, Query, description = "Case-insensitive location prefix"),
        ("mileage" = Option<f64>, Query, description = "Minimum mileage"),
        ("status" = Option<VehicleStatus>, Query, description = "Vehicle status"),
        ("fuel_condition" = Option<FuelCondition>, Query, description = "Fuel condition"),
    ),
    responses(
        (status = 200, description = "Matching tracking events", body = ApiResponse<Vec<TrackingEventResponse>>),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 405, response = MethodNotAllowedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn find_tracking_data<R: TrackingRepository>(
    State(service): State<Arc<TrackingService<R>>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> TrackingResult<ApiResponse<Vec<TrackingEventResponse>>> {
    let Query(pairs) =
        query.map_err(|e| FilterError::MalformedQuery(e.body_text()))?;

    let events = service
        .query(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .await?;

    if events.is_empty() {
        return Err(TrackingError::NoResults);
    }

    let data = events.into_iter().map(TrackingEventResponse::from).collect();
    Ok(ApiResponse::new(data, FETCHED_MESSAGE))
}
