use amplify_store::{ConflictKind, StoreError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::oauth::OAuthError;

#[derive(Debug, Error)]
pub enum ServerError {
    /// A uniqueness rule rejected the request.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Google OAuth not configured")]
    OAuthNotConfigured,

    /// The OAuth provider failed or answered unexpectedly.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServerError::NotFound("Creator not found".into()),
            StoreError::Conflict(ConflictKind::Wallet) => {
                ServerError::Conflict("Wallet already registered with another channel".into())
            }
            StoreError::Conflict(ConflictKind::Channel) => {
                ServerError::Conflict("Channel already registered".into())
            }
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<OAuthError> for ServerError {
    fn from(err: OAuthError) -> Self {
        ServerError::Upstream(err.to_string())
    }
}

impl ServerError {
    /// Text safe to show a client.  Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ServerError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            // Duplicates are reported as bad requests, like any other
            // rejected registration.
            ServerError::Conflict(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::OAuthNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServerError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({
            "error": self.public_message(),
        });

        (status, axum::Json(body)).into_response()
    }
}
