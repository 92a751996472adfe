use axum_helpers::server::{create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_notifications::{NotificationService, SmtpProvider};
use natours_api::{api, config::Config, health, openapi::ApiDoc, state::AppState};
use resource_handler::{DocumentStore, MongoStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(url = %config.mongodb.redacted_url(), "connecting to MongoDB");
    let mongo_client =
        database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;
    let db = mongo_client.database(config.mongodb.database());
    info!(database = config.mongodb.database(), "connected to MongoDB");

    let store: Arc<dyn DocumentStore> = Arc::new(MongoStore::new(db.clone()));
    api::ensure_indexes(&store).await?;

    let mailer = SmtpProvider::new(&config.email)?;
    let state = AppState {
        notifications: NotificationService::new(Arc::new(mailer)),
        store,
        config,
    };

    let router = create_router::<ApiDoc>(api::routes(&state), &state.config.http, state.config.environment)?;
    let app = router
        .merge(health_router(state.config.app))
        .merge(health::router(db));

    info!(environment = ?state.config.environment, "starting Natours API");
    create_production_app(app, &state.config.http.server, Duration::from_secs(30), async move {
        info!("closing MongoDB connections");
        mongo_client.shutdown().await;
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Natours API shutdown complete");
    Ok(())
}
