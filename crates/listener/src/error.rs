//! HTTP mapping for [`deploy::DeployError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use deploy::DeployError;
use serde_json::json;
use tracing::warn;

/// A refused webhook delivery.
///
/// Response bodies are fixed strings: they never echo parser diagnostics or
/// say why a signature was rejected.
#[derive(Debug)]
pub struct ApiError(pub DeployError);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            DeployError::Unauthorized => StatusCode::FORBIDDEN,
            DeployError::UnknownRepository { .. } => StatusCode::NOT_FOUND,
            DeployError::InvalidPayload { .. } => StatusCode::BAD_REQUEST,
            DeployError::DeploymentInProgress { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn public_message(&self) -> &'static str {
        match &self.0 {
            DeployError::Unauthorized => "forbidden",
            DeployError::UnknownRepository { .. } => "unknown repository",
            DeployError::InvalidPayload { .. } => "invalid payload",
            DeployError::DeploymentInProgress { .. } => "deployment in progress",
        }
    }
}

impl From<DeployError> for ApiError {
    fn from(err: DeployError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let DeployError::InvalidPayload { reason } = &self.0 {
            warn!(reason = %reason, "Rejected webhook with invalid payload");
        }
        let body = Json(json!({ "error": self.public_message() }));
        (self.status_code(), body).into_response()
    }
}
