use crate::domain::{FeedConfig, FeedProcess};
use crate::http::NotificationSink;
use common::store::StoreClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct FeedWorkerConfig {
    pub feed_config: FeedConfig,
}

/// The change-feed subscriber component, packaged as a runner process.
pub struct FeedWorker {
    feed_config: FeedConfig,
    client: StoreClient,
    sink: Arc<dyn NotificationSink>,
}

impl FeedWorker {
    pub fn new(
        client: StoreClient,
        sink: Arc<dyn NotificationSink>,
        config: FeedWorkerConfig,
    ) -> Self {
        debug!("initializing feed worker module");
        Self {
            feed_config: config.feed_config,
            client,
            sink,
        }
    }

    #[allow(clippy::type_complexity)]
    pub fn into_runner_process(
        self,
    ) -> Box<
        dyn FnOnce(
                CancellationToken,
            ) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>,
            > + Send,
    > {
        Box::new({
            let feed_config = self.feed_config;
            let client = self.client;
            let sink = self.sink;
            move |ctx| {
                let process = FeedProcess::new(feed_config, client, sink, ctx);
                Box::pin(async move { process.run().await })
            }
        })
    }
}
