use crate::domain::NotificationForwarder;
use crate::http::NotificationSink;
use anyhow::{anyhow, Result};
use common::store::{ChangeFeedOptions, ChangeFeedProcessor, FeedHealth, StoreClient};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Settings for the change-feed subscription.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub database: String,
    /// Container whose change feed is subscribed.
    pub feed_container: String,
    /// Container holding the per-partition lease checkpoints.
    pub lease_container: String,
    /// Host name recorded on the leases this processor owns.
    pub host_name: String,
    pub poll_delay: Duration,
    pub max_batch: usize,
}

/// The long-running subscription process.
///
/// Startup builds and starts the processor; both containers must already
/// exist or the process fails (provisioning is not this component's job).
/// After that it supervises the processor's health until cancelled: a
/// reported poll failure becomes a process error instead of dying
/// silently. On cancellation the processor is stopped and fully drained
/// before the process returns; the store client itself is closed by the
/// binary's closer, after this returns.
pub struct FeedProcess {
    config: FeedConfig,
    client: StoreClient,
    sink: Arc<dyn NotificationSink>,
    cancellation_token: CancellationToken,
}

impl FeedProcess {
    pub fn new(
        config: FeedConfig,
        client: StoreClient,
        sink: Arc<dyn NotificationSink>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            client,
            sink,
            cancellation_token,
        }
    }

    pub async fn run(self) -> Result<()> {
        let database = self.client.database(&self.config.database);
        let handler = Arc::new(NotificationForwarder::new(self.sink));
        let processor = ChangeFeedProcessor::builder(&self.config.host_name)
            .feed_container(database.container(&self.config.feed_container))
            .lease_container(database.container(&self.config.lease_container))
            .options(ChangeFeedOptions {
                poll_delay: self.config.poll_delay,
                max_batch: self.config.max_batch,
            })
            .handle_changes(handler)
            .build()?;

        let mut health = processor.health();
        processor.start().await?;
        info!(
            database = %self.config.database,
            container = %self.config.feed_container,
            "change feed subscription running"
        );

        loop {
            tokio::select! {
                _ = self.cancellation_token.cancelled() => {
                    debug!("feed process cancelled, stopping processor");
                    processor.stop().await;
                    return Ok(());
                }
                changed = health.changed() => {
                    if changed.is_err() {
                        processor.stop().await;
                        return Err(anyhow!("change feed health channel closed"));
                    }
                    let state = health.borrow_and_update().clone();
                    if let FeedHealth::Failed(reason) = state {
                        processor.stop().await;
                        return Err(anyhow!("change feed processor failed: {reason}"));
                    }
                }
            }
        }
    }
}
