//! Error types for the trace API.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use herbtrace_core::TraceError;

/// Errors that can occur in the trace API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The trace service rejected or could not complete the request.
    #[error(transparent)]
    Trace(#[from] TraceError),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A batch identifier could not be parsed from the request path.
    #[error("invalid batch id: {0}")]
    InvalidId(String),

    /// A transaction hash could not be parsed from the request path.
    #[error("invalid transaction hash: {0}")]
    InvalidHash(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Trace(e) if e.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Trace(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Trace(e) if e.is_conflict() => StatusCode::CONFLICT,
            Self::Trace(TraceError::ConfirmationTimeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Self::Trace(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidId(_) | Self::InvalidHash(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            Self::Trace(e) => match e.validation_messages() {
                Some(messages) => serde_json::json!({
                    "error": "Validation failed",
                    "errors": messages,
                    "status": status.as_u16(),
                }),
                None => serde_json::json!({
                    "error": e.to_string(),
                    "status": status.as_u16(),
                }),
            },
            _ => serde_json::json!({
                "error": self.to_string(),
                "status": status.as_u16(),
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}
