use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use finops_tools::{FinOpsApi, FinOpsConfig};
use log::*;
use marketplace_tools::MarketplaceApi;
use order_sync_engine::{
    events::{EventHandlers, EventHooks},
    OrderSyncApi,
    SqliteDatabase,
};
use tokio::sync::watch;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::{FinOpsConnector, MarketplaceConnector},
    notifications::build_dispatcher,
    poll_worker::start_poll_worker,
    routes::{health, ValidateOrderRoute},
    tenants::TenantRegistry,
};

pub const NOTIFICATION_BUFFER_SIZE: usize = 50;

pub type ServerSyncApi = OrderSyncApi<SqliteDatabase, FinOpsConnector, MarketplaceConnector>;

/// Starts the bridge and runs until the HTTP server is stopped (e.g. by SIGINT or SIGTERM). The poll worker is then
/// asked to stop, and any in-flight poll cycle gets the configured grace period to finish.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let registry = TenantRegistry::new(&config.product_ids, &config.webhook_secrets, config.finops.clone())?;
    if registry.is_empty() {
        return Err(ServerError::ConfigurationError("No products are configured in OSB_PRODUCT_IDS".into()));
    }
    let api = Arc::new(create_sync_api(&config, &registry).await?);
    let (shutdown, shutdown_signal) = watch::channel(false);
    let poll_worker = start_poll_worker(
        Arc::clone(&api),
        registry.product_ids(),
        config.poll_interval,
        config.poll_concurrency,
        shutdown_signal,
        config.shutdown_grace,
    );
    let srv = create_server_instance(&config, api, registry)?;
    let result = srv.await;
    info!("🚀️ HTTP server stopped. Stopping the poll worker.");
    if shutdown.send(true).is_err() {
        debug!("🚀️ The poll worker had already stopped");
    }
    match poll_worker.await {
        Ok(cycles) => info!("🚀️ Poll worker stopped after {cycles} cycles"),
        Err(e) => error!("🚀️ The poll worker did not stop cleanly. {e}"),
    }
    result.map_err(ServerError::from)
}

/// Connects to the database, runs migrations, builds the API clients and starts the notification handlers. The FinOps
/// client signs its requests with the credential set held by the tenant registry.
pub async fn create_sync_api(config: &ServerConfig, registry: &TenantRegistry) -> Result<ServerSyncApi, ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let finops_config = FinOpsConfig::clone(&registry.finops_credential());
    let finops = FinOpsApi::new(finops_config).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let marketplace =
        MarketplaceApi::new(config.marketplace.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;

    let dispatcher = build_dispatcher(&config.notifications)?;
    let mut hooks = EventHooks::default();
    hooks.add_notification_handler(dispatcher.into_handler());
    let handlers = EventHandlers::new(NOTIFICATION_BUFFER_SIZE, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let api = OrderSyncApi::new(db, FinOpsConnector::new(finops), MarketplaceConnector::new(marketplace), producers)
        .with_retry_policy(config.retry)
        .with_due_date_period(chrono::Duration::days(config.due_date_days));
    Ok(api)
}

pub fn create_server_instance(
    config: &ServerConfig,
    api: Arc<ServerSyncApi>,
    registry: TenantRegistry,
) -> Result<Server, ServerError> {
    let api = web::Data::from(api);
    let registry = web::Data::new(registry);
    let srv = HttpServer::new(move || {
        let webhook_scope = web::scope("/v1/products/{product_id}")
            .service(ValidateOrderRoute::<SqliteDatabase, FinOpsConnector, MarketplaceConnector>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("osb::access_log"))
            .app_data(api.clone())
            .app_data(registry.clone())
            .service(health)
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .shutdown_timeout(config.shutdown_grace.as_secs())
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
