//! Standardized API error responses for all dashboard endpoints.
//!
//! # Response Format
//!
//! Every error response has this JSON structure:
//!
//! ```json
//! {
//!   "error": "Authentication token has expired",
//!   "code": "TOKEN_EXPIRED"
//! }
//! ```
//!
//! Internal failures (configuration, store) carry a generic message; the
//! underlying cause is only written to the log.

use axum::{
    extract::{rejection::PathRejection, Request},
    http::{header::ALLOW, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::errors::DashError;
use crate::server::validation::ValidationError;

/// Machine-readable error codes for API responses.
///
/// These codes are stable and can be used by clients for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // === Request Errors (400) ===
    /// Request payload is invalid or malformed
    InvalidRequest,
    /// A required field is missing
    MissingField,
    /// A field value is invalid
    InvalidField,
    /// Authorization header could not be read
    InvalidHeader,

    // === Authentication Errors (401) ===
    /// Username/password pair was rejected
    InvalidCredentials,
    /// No session token in header or cookie
    MissingToken,
    /// Token could not be decoded
    MalformedToken,
    /// Token signature does not verify
    InvalidSignature,
    /// Token algorithm, key or audience cannot be verified by this server
    UnverifiableToken,
    /// Token lifetime is over
    TokenExpired,
    /// Token `nbf` is in the future
    TokenNotYetValid,

    // === Resource Errors (404/409) ===
    /// License does not exist
    LicenseNotFound,
    /// Publication does not exist
    PublicationNotFound,
    /// Route does not exist
    NotFound,
    /// Route exists but not for this HTTP method
    MethodNotAllowed,
    /// License status does not allow the requested transition
    InvalidStateTransition,

    // === Server Errors (5xx) ===
    /// Server configuration error
    ConfigError,
    /// License store failed
    StoreError,
    /// Unexpected internal server error
    InternalError,
}

impl ErrorCode {
    /// Returns the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidRequest
            | ErrorCode::MissingField
            | ErrorCode::InvalidField
            | ErrorCode::InvalidHeader => StatusCode::BAD_REQUEST,

            ErrorCode::InvalidCredentials
            | ErrorCode::MissingToken
            | ErrorCode::MalformedToken
            | ErrorCode::InvalidSignature
            | ErrorCode::UnverifiableToken
            | ErrorCode::TokenExpired
            | ErrorCode::TokenNotYetValid => StatusCode::UNAUTHORIZED,

            ErrorCode::LicenseNotFound | ErrorCode::PublicationNotFound | ErrorCode::NotFound => {
                StatusCode::NOT_FOUND
            }

            ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,

            ErrorCode::InvalidStateTransition => StatusCode::CONFLICT,

            ErrorCode::ConfigError | ErrorCode::StoreError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns a default human-readable message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "Request payload is invalid",
            ErrorCode::MissingField => "A required field is missing",
            ErrorCode::InvalidField => "A field value is invalid",
            ErrorCode::InvalidHeader => "Authorization header is malformed",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::MissingToken => "No authentication token provided",
            ErrorCode::MalformedToken => "Token is malformed",
            ErrorCode::InvalidSignature => "Invalid token signature",
            ErrorCode::UnverifiableToken => "Token could not be verified",
            ErrorCode::TokenExpired => "Token has expired",
            ErrorCode::TokenNotYetValid => "Token not valid yet",
            ErrorCode::LicenseNotFound => "The requested license does not exist",
            ErrorCode::PublicationNotFound => "The requested publication does not exist",
            ErrorCode::NotFound => "The requested resource was not found",
            ErrorCode::MethodNotAllowed => "Method not allowed for this resource",
            ErrorCode::InvalidStateTransition => "License status does not allow this operation",
            ErrorCode::ConfigError => "Server configuration error",
            ErrorCode::StoreError => "License store is unavailable",
            ErrorCode::InternalError => "An unexpected error occurred",
        }
    }
}

/// Standardized API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable error message
    pub error: String,
    /// Machine-readable error code
    pub code: ErrorCode,
}

impl ApiError {
    /// Creates a new API error with the default message for `code`.
    pub fn new(code: ErrorCode) -> Self {
        Self {
            error: code.default_message().to_string(),
            code,
        }
    }

    /// Creates a new API error with a custom message.
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    /// Missing required field error.
    pub fn missing_field(field: &str) -> Self {
        Self::with_message(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
    }

    /// Invalid field value error.
    pub fn invalid_field(field: &str, reason: &str) -> Self {
        Self::with_message(
            ErrorCode::InvalidField,
            format!("Invalid value for '{}': {}", field, reason),
        )
    }

    pub fn not_found() -> Self {
        Self::new(ErrorCode::NotFound)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.error)
    }
}

impl std::error::Error for ApiError {}

impl From<DashError> for ApiError {
    fn from(err: DashError) -> Self {
        match err {
            DashError::LicenseNotFound(id) => ApiError::with_message(
                ErrorCode::LicenseNotFound,
                format!("License '{id}' not found"),
            ),
            DashError::PublicationNotFound(uuid) => ApiError::with_message(
                ErrorCode::PublicationNotFound,
                format!("Publication '{uuid}' not found"),
            ),
            DashError::InvalidStateTransition { license_id, from } => ApiError::with_message(
                ErrorCode::InvalidStateTransition,
                format!("License '{license_id}' is {from} and cannot be revoked"),
            ),
            DashError::ConfigError(msg) => {
                error!(error = %msg, "configuration error while serving request");
                ApiError::new(ErrorCode::ConfigError)
            }
            DashError::StoreError(msg) => {
                error!(error = %msg, "license store failure");
                ApiError::new(ErrorCode::StoreError)
            }
            DashError::ServerError(msg) => {
                error!(error = %msg, "internal server error");
                ApiError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        if err.missing {
            ApiError::missing_field(&err.field)
        } else {
            ApiError::invalid_field(&err.field, &err.message)
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        if rejection.status().is_server_error() {
            error!(error = %rejection.body_text(), "path parameters not bound to route");
            return ApiError::new(ErrorCode::InternalError);
        }
        ApiError::with_message(ErrorCode::InvalidField, rejection.body_text())
    }
}

/// Replace the router's bare `405` with the JSON envelope.
///
/// The `Allow` header of the original response is preserved.
pub async fn method_not_allowed_as_json(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(ALLOW).cloned();
    let mut json = ApiError::new(ErrorCode::MethodNotAllowed).into_response();
    if let Some(allow) = allow {
        json.headers_mut().insert(ALLOW, allow);
    }
    json
}
