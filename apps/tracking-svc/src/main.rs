use axum_helpers::server::{ShutdownCoordinator, create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_tracking::{MongoTrackingRepository, TrackingService};
use eyre::WrapErr;
use tracing::{error, info};

mod api;
mod config;
mod ingest;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let metrics = messaging::metrics::install_prometheus()?;

    info!("Connecting to MongoDB at {}", config.mongodb.redacted_url());
    let mongo_client = database::mongodb::connect_from_config_with_retry(&config.mongodb, None)
        .await
        .wrap_err("Failed to connect to MongoDB")?;
    let db = mongo_client.database(config.mongodb.database());

    let repository = MongoTrackingRepository::new(&db);
    repository
        .ensure_indexes()
        .await
        .wrap_err("Failed to create tracking indexes")?;
    let tracking = TrackingService::new(repository);

    let coordinator = ShutdownCoordinator::new();
    coordinator.listen_for_signals();

    let worker = ingest::start(
        &config.broker,
        config.app.name,
        tracking.clone(),
        coordinator.subscribe(),
    )
    .await?;

    let state = AppState {
        config,
        mongo_client,
        tracking,
        metrics,
    };

    let router = axum_helpers::create_router::<openapi::ApiDoc>(api::routes(&state)).await?;
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::operational_routes(&state));

    info!(
        inbound = %state.config.broker.inbound_queue,
        outbound = %state.config.broker.outbound_queue,
        "Starting tracking service"
    );

    let server = state.config.server.clone();
    create_production_app(app, &server, &coordinator, async move {
        info!("Shutting down: draining ingest worker");
        if let Err(e) = worker.await {
            error!(error = %e, "Ingest worker task failed");
        }
        drop(state);
        info!("MongoDB connections closed");
    })
    .await
    .wrap_err("Server error")?;

    info!("Tracking service shutdown complete");
    Ok(())
}
