use crate::domain::{DomainError, DomainResult};
use crate::store::{ContainerHandle, ItemQuery};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Receives every change batch read from the feed, in delivered order.
///
/// The trait is infallible on purpose: whatever the handler does with a
/// batch must not stall or kill the subscription.
#[async_trait]
pub trait ChangeHandler: Send + Sync {
    async fn handle_changes(&self, docs: Vec<Value>);
}

/// Observable state of a running processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedHealth {
    Starting,
    Running,
    Failed(String),
    Stopped,
}

/// Tunables for the poll loop.
#[derive(Debug, Clone)]
pub struct ChangeFeedOptions {
    /// Delay between feed polls.
    pub poll_delay: Duration,
    /// Upper bound on documents per delivered batch.
    pub max_batch: usize,
}

impl Default for ChangeFeedOptions {
    fn default() -> Self {
        Self {
            poll_delay: Duration::from_secs(5),
            max_batch: 100,
        }
    }
}

/// Builder for [`ChangeFeedProcessor`].
pub struct ChangeFeedProcessorBuilder {
    host_name: String,
    feed_container: Option<ContainerHandle>,
    lease_container: Option<ContainerHandle>,
    options: ChangeFeedOptions,
    handler: Option<Arc<dyn ChangeHandler>>,
}

impl ChangeFeedProcessorBuilder {
    pub fn new(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            feed_container: None,
            lease_container: None,
            options: ChangeFeedOptions::default(),
            handler: None,
        }
    }

    pub fn feed_container(mut self, container: ContainerHandle) -> Self {
        self.feed_container = Some(container);
        self
    }

    pub fn lease_container(mut self, container: ContainerHandle) -> Self {
        self.lease_container = Some(container);
        self
    }

    pub fn options(mut self, options: ChangeFeedOptions) -> Self {
        self.options = options;
        self
    }

    pub fn handle_changes(mut self, handler: Arc<dyn ChangeHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn build(self) -> DomainResult<ChangeFeedProcessor> {
        let feed = self
            .feed_container
            .ok_or_else(|| DomainError::ChangeFeed("feed container not set".to_string()))?;
        let lease = self
            .lease_container
            .ok_or_else(|| DomainError::ChangeFeed("lease container not set".to_string()))?;
        let handler = self
            .handler
            .ok_or_else(|| DomainError::ChangeFeed("change handler not set".to_string()))?;
        let (health_tx, _) = watch::channel(FeedHealth::Starting);
        Ok(ChangeFeedProcessor {
            host_name: self.host_name,
            feed,
            lease,
            options: self.options,
            handler,
            token: CancellationToken::new(),
            health_tx,
            task: Mutex::new(None),
        })
    }
}

/// Long-lived change-feed subscription with per-partition lease
/// checkpoints.
///
/// `start` verifies both containers exist, restores the lease
/// continuations, and spawns a supervised poll loop; failures inside the
/// loop are reported through the health channel rather than dropped.
/// `stop` cancels the loop and blocks until it has fully exited. Stop must
/// happen before the owning [`StoreClient`](crate::store::StoreClient) is
/// closed.
pub struct ChangeFeedProcessor {
    host_name: String,
    feed: ContainerHandle,
    lease: ContainerHandle,
    options: ChangeFeedOptions,
    handler: Arc<dyn ChangeHandler>,
    token: CancellationToken,
    health_tx: watch::Sender<FeedHealth>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ChangeFeedProcessor {
    pub fn builder(host_name: impl Into<String>) -> ChangeFeedProcessorBuilder {
        ChangeFeedProcessorBuilder::new(host_name)
    }

    /// Subscribe to processor health transitions.
    pub fn health(&self) -> watch::Receiver<FeedHealth> {
        self.health_tx.subscribe()
    }

    /// Starts the poll loop. Fails if either container is missing; no
    /// container is created on the processor's behalf.
    pub async fn start(&self) -> DomainResult<()> {
        let mut task = self.task.lock().await;
        if task.is_some() {
            return Err(DomainError::ChangeFeed(
                "processor already started".to_string(),
            ));
        }
        if !self.feed.exists().await? {
            return Err(DomainError::ChangeFeed(format!(
                "feed container {}/{} does not exist",
                self.feed.database_name(),
                self.feed.name()
            )));
        }
        if !self.lease.exists().await? {
            return Err(DomainError::ChangeFeed(format!(
                "lease container {}/{} does not exist",
                self.lease.database_name(),
                self.lease.name()
            )));
        }

        let ranges = self.feed.partition_ranges().await?;
        let mut leases = Vec::with_capacity(ranges.len());
        for range in &ranges {
            let continuation = self.load_continuation(range).await?;
            leases.push((range.clone(), continuation));
        }
        info!(
            host = %self.host_name,
            container = %self.feed.name(),
            ranges = leases.len(),
            poll_delay_ms = self.options.poll_delay.as_millis() as u64,
            "starting change feed processor"
        );

        let loop_ctx = PollLoop {
            host_name: self.host_name.clone(),
            feed: self.feed.clone(),
            lease: self.lease.clone(),
            options: self.options.clone(),
            handler: Arc::clone(&self.handler),
            token: self.token.clone(),
            health_tx: self.health_tx.clone(),
        };
        *task = Some(tokio::spawn(loop_ctx.run(leases)));
        let _ = self.health_tx.send(FeedHealth::Running);
        Ok(())
    }

    /// Stops the poll loop, blocking until it has exited. Idempotent.
    pub async fn stop(&self) {
        self.token.cancel();
        let handle = self.task.lock().await.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!(error = %err, "change feed poll task join failed");
            }
        }
        let _ = self.health_tx.send(FeedHealth::Stopped);
        info!(host = %self.host_name, "change feed processor stopped");
    }

    fn lease_id(host_name: &str, range: &str) -> String {
        format!("{host_name}.{range}")
    }

    async fn load_continuation(&self, range: &str) -> DomainResult<u64> {
        let lease_id = Self::lease_id(&self.host_name, range);
        let (docs, _) = self.lease.query_raw(&ItemQuery::ById(lease_id)).await?;
        Ok(docs
            .first()
            .and_then(|doc| doc.get("continuation"))
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }
}

struct PollLoop {
    host_name: String,
    feed: ContainerHandle,
    lease: ContainerHandle,
    options: ChangeFeedOptions,
    handler: Arc<dyn ChangeHandler>,
    token: CancellationToken,
    health_tx: watch::Sender<FeedHealth>,
}

impl PollLoop {
    async fn run(self, mut leases: Vec<(String, u64)>) {
        loop {
            for (range, continuation) in leases.iter_mut() {
                if self.token.is_cancelled() {
                    return;
                }
                match self.poll_range(range, *continuation).await {
                    Ok(next) => *continuation = next,
                    Err(err) => {
                        error!(error = %err, range = %range, "change feed poll failed");
                        let _ = self.health_tx.send(FeedHealth::Failed(err.to_string()));
                        return;
                    }
                }
            }
            tokio::select! {
                _ = self.token.cancelled() => return,
                _ = tokio::time::sleep(self.options.poll_delay) => {}
            }
        }
    }

    /// Reads one batch for a range, hands it to the handler, and
    /// checkpoints the lease. Returns the new continuation.
    async fn poll_range(&self, range: &str, continuation: u64) -> DomainResult<u64> {
        let batch = self
            .feed
            .read_changes(range, continuation, self.options.max_batch)
            .await?;
        if batch.docs.is_empty() {
            return Ok(continuation);
        }
        debug!(
            range = %range,
            docs = batch.docs.len(),
            continuation = batch.continuation,
            "delivering change batch"
        );
        self.handler.handle_changes(batch.docs).await;

        // Checkpoint after delivery: a crash in between re-delivers the
        // batch (at-least-once).
        let lease_doc = json!({
            "id": ChangeFeedProcessor::lease_id(&self.host_name, range),
            "owner": self.host_name,
            "continuation": batch.continuation,
        });
        self.lease.upsert_raw(lease_doc).await?;
        Ok(batch.continuation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{StoreClient, StoreConfig};
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::Mutex as AsyncMutex;
    use tokio::time::timeout;

    const DB: &str = "MESSAGES";
    const FEED: &str = "message";
    const LEASE: &str = "message-leases";

    struct RecordingHandler {
        batches: AsyncMutex<Vec<Vec<Value>>>,
        notify: tokio::sync::Notify,
    }

    impl RecordingHandler {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                batches: AsyncMutex::new(Vec::new()),
                notify: tokio::sync::Notify::new(),
            })
        }

        async fn doc_count(&self) -> usize {
            self.batches.lock().await.iter().map(Vec::len).sum()
        }

        async fn wait_for_docs(&self, want: usize) {
            timeout(Duration::from_secs(5), async {
                while self.doc_count().await < want {
                    self.notify.notified().await;
                }
            })
            .await
            .expect("timed out waiting for change docs");
        }
    }

    #[async_trait]
    impl ChangeHandler for RecordingHandler {
        async fn handle_changes(&self, docs: Vec<Value>) {
            self.batches.lock().await.push(docs);
            self.notify.notify_waiters();
        }
    }

    async fn provisioned_client() -> StoreClient {
        let client = StoreClient::connect(StoreConfig::new("https://localhost:8081/", "key"))
            .unwrap();
        client.create_database(DB).await.unwrap();
        let db = client.database(DB);
        db.create_container(FEED, "/id", 400).await.unwrap();
        db.create_container(LEASE, "/id", 400).await.unwrap();
        client
    }

    fn fast_options() -> ChangeFeedOptions {
        ChangeFeedOptions {
            poll_delay: Duration::from_millis(10),
            max_batch: 100,
        }
    }

    fn processor(client: &StoreClient, handler: Arc<dyn ChangeHandler>) -> ChangeFeedProcessor {
        let db = client.database(DB);
        ChangeFeedProcessor::builder("change-feedhost")
            .feed_container(db.container(FEED))
            .lease_container(db.container(LEASE))
            .options(fast_options())
            .handle_changes(handler)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn start_fails_when_lease_container_missing() {
        let client = provisioned_client().await;
        client.database(DB).delete_container(LEASE).await.unwrap();
        let proc = processor(&client, RecordingHandler::new());
        let err = proc.start().await.unwrap_err();
        assert!(matches!(err, DomainError::ChangeFeed(_)));
    }

    #[tokio::test]
    async fn start_fails_when_feed_container_missing() {
        let client = provisioned_client().await;
        client.database(DB).delete_container(FEED).await.unwrap();
        let proc = processor(&client, RecordingHandler::new());
        assert!(proc.start().await.is_err());
    }

    #[tokio::test]
    async fn delivers_documents_in_change_order() {
        let client = provisioned_client().await;
        let feed = client.database(DB).container(FEED);
        for id in ["u1", "u2", "u3"] {
            feed.upsert_raw(json!({"id": id})).await.unwrap();
        }

        let handler = RecordingHandler::new();
        let proc = processor(&client, handler.clone());
        proc.start().await.unwrap();
        handler.wait_for_docs(3).await;
        proc.stop().await;

        let batches = handler.batches.lock().await;
        let ids: Vec<String> = batches
            .iter()
            .flatten()
            .map(|doc| doc["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["u1", "u2", "u3"]);
    }

    #[tokio::test]
    async fn resumes_from_lease_checkpoint() {
        let client = provisioned_client().await;
        let feed = client.database(DB).container(FEED);
        feed.upsert_raw(json!({"id": "old"})).await.unwrap();

        let first = RecordingHandler::new();
        let proc = processor(&client, first.clone());
        proc.start().await.unwrap();
        first.wait_for_docs(1).await;
        proc.stop().await;

        feed.upsert_raw(json!({"id": "new"})).await.unwrap();

        let second = RecordingHandler::new();
        let proc = processor(&client, second.clone());
        proc.start().await.unwrap();
        second.wait_for_docs(1).await;
        proc.stop().await;

        let batches = second.batches.lock().await;
        let ids: Vec<&str> = batches
            .iter()
            .flatten()
            .map(|doc| doc["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["new"]);
    }

    #[tokio::test]
    async fn stop_blocks_until_no_further_deliveries() {
        let client = provisioned_client().await;
        let feed = client.database(DB).container(FEED);
        feed.upsert_raw(json!({"id": "first"})).await.unwrap();

        let handler = RecordingHandler::new();
        let proc = processor(&client, handler.clone());
        proc.start().await.unwrap();
        handler.wait_for_docs(1).await;
        proc.stop().await;

        feed.upsert_raw(json!({"id": "late"})).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(handler.doc_count().await, 1);

        // Stop-then-close ordering: close only after stop returned.
        client.close();
    }

    #[tokio::test]
    async fn poll_failure_surfaces_through_health_channel() {
        let client = provisioned_client().await;
        let handler = RecordingHandler::new();
        let proc = processor(&client, handler);
        let mut health = proc.health();
        proc.start().await.unwrap();
        assert_eq!(*health.borrow_and_update(), FeedHealth::Running);

        // Pull the feed container out from under the running loop.
        client.database(DB).delete_container(FEED).await.unwrap();

        timeout(Duration::from_secs(5), async {
            loop {
                health.changed().await.unwrap();
                if matches!(*health.borrow(), FeedHealth::Failed(_)) {
                    break;
                }
            }
        })
        .await
        .expect("processor never reported failure");
        proc.stop().await;
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let client = provisioned_client().await;
        let proc = processor(&client, RecordingHandler::new());
        proc.start().await.unwrap();
        assert!(proc.start().await.is_err());
        proc.stop().await;
    }
}
