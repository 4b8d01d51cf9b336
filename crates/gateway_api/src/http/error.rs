use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::domain::DomainError;
use serde_json::Value;
use tracing::error;

/// HTTP mapping of [`DomainError`].
///
/// Not-found outcomes keep the sample's lenient convention: a JSON null
/// body with status 200. Everything else is a 500 plus a log line.
pub struct ApiError(DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            DomainError::DatabaseNotFound(_)
            | DomainError::ContainerNotFound(_, _)
            | DomainError::ItemNotFound(_) => Json(Value::Null).into_response(),
            err => {
                error!(error = %err, "gateway request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
            }
        }
    }
}
