use reqwest::{header::CONTENT_TYPE, StatusCode};
use url::Url;

/// Errors from a single webhook delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("invalid webhook URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to send webhook request: {0}")]
    RequestSend(#[source] reqwest::Error),

    #[error("webhook responded with error [{code}]")]
    ErrorStatus { code: StatusCode },
}

pub type WebhookResult<T> = Result<T, WebhookError>;

/// HTTP client for the notification endpoint.
///
/// One POST per payload: no retry, no signature, no auth headers. Timeouts
/// are whatever the underlying HTTP client defaults to.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    endpoint: Url,
    http_client: reqwest::Client,
}

impl WebhookClient {
    pub fn new(endpoint: &str) -> WebhookResult<Self> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
            http_client: reqwest::Client::new(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POSTs a pre-serialized JSON body, reporting only success/failure.
    pub async fn post_json(&self, body: String) -> WebhookResult<()> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(WebhookError::RequestSend)?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(WebhookError::ErrorStatus { code: status })
        }
    }
}
