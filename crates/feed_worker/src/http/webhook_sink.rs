use common::webhook::WebhookClient;
use tracing::{info, warn};

/// Destination for mapped notification payloads.
///
/// `submit` must not block the caller: delivery happens in the background
/// and only its outcome is logged. No retry.
pub trait NotificationSink: Send + Sync {
    fn submit(&self, payload: String);
}

/// Webhook-backed sink: each payload becomes one asynchronous HTTP POST.
///
/// A failed delivery is logged and dropped so that it can never stall or
/// kill the change-feed subscription driving it.
pub struct WebhookNotificationSink {
    client: WebhookClient,
}

impl WebhookNotificationSink {
    pub fn new(client: WebhookClient) -> Self {
        Self { client }
    }
}

impl NotificationSink for WebhookNotificationSink {
    fn submit(&self, payload: String) {
        let client = self.client.clone();
        tokio::spawn(async move {
            match client.post_json(payload).await {
                Ok(()) => info!("notification delivered"),
                Err(err) => warn!(error = %err, "notification delivery failed"),
            }
        });
    }
}
