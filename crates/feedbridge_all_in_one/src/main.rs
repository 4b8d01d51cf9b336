mod config;

use crate::config::ServiceConfig;
use common::store::{StoreClient, StoreConfig};
use common::telemetry::{init_telemetry, TelemetryConfig};
use common::webhook::WebhookClient;
use feed_worker::domain::FeedConfig;
use feed_worker::feed_worker::{FeedWorker, FeedWorkerConfig};
use feed_worker::http::WebhookNotificationSink;
use feedbridge_runner::Runner;
use gateway_api::gateway_api::GatewayApi;
use gateway_api::http::HttpServerConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_telemetry(&TelemetryConfig {
        service_name: "feedbridge".to_string(),
        log_level: config.log_level.clone(),
        json_output: config.log_json,
    }) {
        eprintln!("Failed to initialize telemetry: {}", e);
        std::process::exit(1);
    }

    info!(
        endpoint = %config.store_endpoint,
        webhook = %config.webhook_url,
        "starting feedbridge service"
    );

    let store_config = StoreConfig::new(&config.store_endpoint, &config.store_key)
        .with_preferred_region(&config.store_region)
        .with_consistency_level(config.store_consistency);
    let client = match StoreClient::connect(store_config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect store client: {}", e);
            std::process::exit(1);
        }
    };

    // The in-memory backend starts empty, and the feed processor refuses
    // to start against missing containers.
    if let Err(e) = provision_feed_containers(&client, &config).await {
        error!("Failed to provision feed containers: {}", e);
        std::process::exit(1);
    }

    let webhook_client = match WebhookClient::new(&config.webhook_url) {
        Ok(client) => client,
        Err(e) => {
            error!("Invalid webhook URL: {}", e);
            std::process::exit(1);
        }
    };
    let sink = Arc::new(WebhookNotificationSink::new(webhook_client));

    let feed_worker = FeedWorker::new(
        client.clone(),
        sink,
        FeedWorkerConfig {
            feed_config: FeedConfig {
                database: config.feed_database.clone(),
                feed_container: config.feed_container.clone(),
                lease_container: config.lease_container.clone(),
                host_name: config.feed_host_name.clone(),
                poll_delay: Duration::from_secs(config.feed_poll_secs),
                max_batch: config.feed_max_batch,
            },
        },
    );

    let gateway_api = GatewayApi::new(
        client.clone(),
        HttpServerConfig {
            host: config.http_host.clone(),
            port: config.http_port,
        },
    );

    // Shutdown order: the feed process stops its processor on
    // cancellation, the runner drains every process, and only then does
    // the closer release the client.
    let closer_client = client.clone();
    Runner::new()
        .with_app_process(feed_worker.into_runner_process())
        .with_app_process(gateway_api.into_runner_process())
        .with_closer(move || async move {
            closer_client.close();
            Ok(())
        })
        .with_closer_timeout(Duration::from_secs(10))
        .run()
        .await;
}

async fn provision_feed_containers(
    client: &StoreClient,
    config: &ServiceConfig,
) -> anyhow::Result<()> {
    client.create_database(&config.feed_database).await?;
    let database = client.database(&config.feed_database);
    database
        .create_container(&config.feed_container, "/id", 400)
        .await?;
    database
        .create_container(&config.lease_container, "/id", 400)
        .await?;
    info!(
        database = %config.feed_database,
        feed = %config.feed_container,
        lease = %config.lease_container,
        "provisioned feed containers"
    );
    Ok(())
}
