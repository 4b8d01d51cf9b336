use crate::domain::{PersonService, ProvisioningService};
use crate::http::{run_gateway_http_server, AppState, HttpServerConfig};
use common::store::StoreClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// The gateway component, packaged as a runner process.
pub struct GatewayApi {
    state: Arc<AppState>,
    config: HttpServerConfig,
}

impl GatewayApi {
    pub fn new(client: StoreClient, config: HttpServerConfig) -> Self {
        debug!("initializing gateway API module");
        Self {
            state: Arc::new(AppState {
                persons: PersonService::new(client.clone()),
                provisioning: ProvisioningService::new(client),
            }),
            config,
        }
    }

    pub fn into_runner_process(
        self,
    ) -> impl FnOnce(
        CancellationToken,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>,
    > {
        move |ctx| {
            Box::pin(async move { run_gateway_http_server(self.config, self.state, ctx).await })
        }
    }
}
