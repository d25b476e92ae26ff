//! OpenAPI documentation configuration

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tracking Service API",
        version = "0.1.0",
        description = "Vehicle tracking data ingested from the tracking queue",
        license(name = "MIT")
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    nest(
        (path = "/v1", api = domain_tracking::ApiDoc)
    )
)]
pub struct ApiDoc;
