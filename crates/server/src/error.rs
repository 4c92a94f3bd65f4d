use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::warn;

use paverly_core::errors::InterfaceError;
use paverly_db::repositories::RepositoryError;
use paverly_vision::VisionError;

/// JSON error envelope shared by every route: `{ "error": "..." }` plus a
/// status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    pub fn unauthorized() -> Self {
        Self { status: StatusCode::UNAUTHORIZED, message: "invalid admin password".to_string() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: message.into() }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self { status: StatusCode::SERVICE_UNAVAILABLE, message: message.into() }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_GATEWAY, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<InterfaceError> for ApiError {
    fn from(error: InterfaceError) -> Self {
        match error {
            // Guard failures are surfaced inline with their detail; the
            // other layers only get the user-safe text.
            InterfaceError::BadRequest { message, .. } => Self::bad_request(message),
            other @ InterfaceError::ServiceUnavailable { .. } => {
                Self::unavailable(other.user_message())
            }
            other @ InterfaceError::Internal { .. } => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: other.user_message().to_string(),
            },
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        warn!(error = %error, "repository call failed");
        Self::unavailable("The service is temporarily unavailable. Please retry shortly.")
    }
}

impl From<VisionError> for ApiError {
    fn from(error: VisionError) -> Self {
        match error {
            VisionError::MissingApiKey => {
                Self::unavailable("visualization service is not configured")
            }
            VisionError::InvalidImage(message) => Self::bad_request(message),
            other => Self::upstream(other.to_string()),
        }
    }
}
