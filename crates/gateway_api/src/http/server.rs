use crate::domain::{PersonService, ProvisioningService};
use crate::http::{person_handler, provisioning_handler};
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Bind settings for the gateway HTTP server.
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

/// Shared handler state: the domain services over the one store client.
pub struct AppState {
    pub persons: PersonService,
    pub provisioning: ProvisioningService,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/gateway/database",
            get(provisioning_handler::list_databases),
        )
        .route(
            "/gateway/database/create-database",
            post(provisioning_handler::create_database),
        )
        .route(
            "/gateway/database/delete-database",
            delete(provisioning_handler::delete_database),
        )
        .route(
            "/gateway/database/:database/container",
            get(provisioning_handler::list_containers),
        )
        .route(
            "/gateway/database/:database/container/create-container",
            post(provisioning_handler::create_container),
        )
        .route(
            "/gateway/database/:database/container/delete-container",
            delete(provisioning_handler::delete_container),
        )
        .route(
            "/gateway/database/:database/container/:container/item",
            get(person_handler::list_all_items),
        )
        .route(
            "/gateway/database/:database/container/:container/item/offset/:offset",
            get(person_handler::list_items_by_offset),
        )
        .route(
            "/gateway/database/:database/container/:container/item/preferred",
            get(person_handler::stream_item_pages),
        )
        .route(
            "/gateway/database/:database/container/:container/item/:id",
            get(person_handler::get_item),
        )
        .route(
            "/gateway/database/:database/container/:container/item/addItem",
            post(person_handler::add_item),
        )
        .with_state(state)
}

/// Serves the gateway until the cancellation token fires.
pub async fn run_gateway_http_server(
    config: HttpServerConfig,
    state: Arc<AppState>,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "gateway HTTP server listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { cancellation_token.cancelled().await })
        .await?;
    info!("gateway HTTP server stopped");
    Ok(())
}
