// HTTP API error types.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::store::StoreError;
use crate::validation::FieldError;

/// HTTP API error with appropriate status codes and client-safe messages.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error; carries the underlying failure's
    // one-line description when one is available.
    Internal(Option<String>),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message.
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message) => message,
            ApiError::Validation { message, .. } => message,
            ApiError::Internal(Some(_)) => "Internal server error",
            ApiError::Internal(None) => "An unknown error occurred",
        }
    }

    /// JSON response body.
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Validation { message, errors } => {
                json!({ "message": message, "errors": errors })
            }
            ApiError::Internal(Some(detail)) => {
                json!({ "message": self.message(), "error": detail })
            }
            _ => json!({ "message": self.message() }),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        ApiError::Validation {
            message: message.into(),
            errors,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        ApiError::Internal(Some(detail.into()))
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateEmail => {
                ApiError::conflict("Email is already in use. Please choose another.")
            }
            StoreError::Backend(error) => {
                // Full detail stays in the server log; the client gets the
                // one-line description only.
                tracing::error!(%error, "store operation failed");
                ApiError::internal(error.to_string())
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
