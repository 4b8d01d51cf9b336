use crate::domain::{canonical_json, to_notification};
use crate::http::NotificationSink;
use async_trait::async_trait;
use common::store::ChangeHandler;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-batch change handler: maps each changed document to a notification
/// and submits it to the sink, in the batch's delivered order.
///
/// One submission per document. A document that fails to map is logged
/// and skipped; it never aborts the rest of the batch, and sink failures
/// never reach the feed processor.
pub struct NotificationForwarder {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationForwarder {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl ChangeHandler for NotificationForwarder {
    async fn handle_changes(&self, docs: Vec<Value>) {
        info!(docs = docs.len(), "received change batch");
        for doc in docs {
            let notification = match to_notification(doc) {
                Ok(notification) => notification,
                Err(err) => {
                    warn!(error = %err, "skipping unmappable change document");
                    continue;
                }
            };
            match canonical_json(&notification) {
                Ok(payload) => {
                    debug!(payload = %payload, "forwarding notification");
                    self.sink.submit(payload);
                }
                Err(err) => warn!(error = %err, "failed to serialize notification"),
            }
        }
    }
}
