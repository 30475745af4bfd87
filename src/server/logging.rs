//! Tracing setup, request logging and audit events for the dashboard.
//!
//! Every request gets a unique id that is:
//! - attached to the request span,
//! - logged with method, path, status and duration,
//! - echoed back in the `X-Request-Id` response header.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lcp_dashboard::server::logging::request_logging_middleware;
//!
//! let app = Router::new()
//!     .route("/health", get(health_handler))
//!     .layer(middleware::from_fn(request_logging_middleware));
//! ```

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, Response},
    middleware::Next,
};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::LoggingConfig;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `logging.level`. Calling this more than
/// once is a no-op.
pub fn init_tracing(config: &LoggingConfig) {
    if !config.enabled {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_lowercase()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Operator actions recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent {
    /// Operator obtained a session token
    LoginSucceeded,
    /// Credentials were rejected
    LoginFailed,
    /// License moved to `revoked`
    LicenseRevoked,
    /// Revocation refused for the license's current status
    RevokeRejected,
    /// Publication removed from the catalog
    PublicationDeleted,
}

impl std::fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditEvent::LoginSucceeded => "login_succeeded",
            AuditEvent::LoginFailed => "login_failed",
            AuditEvent::LicenseRevoked => "license_revoked",
            AuditEvent::RevokeRejected => "revoke_rejected",
            AuditEvent::PublicationDeleted => "publication_deleted",
        };
        write!(f, "{}", s)
    }
}

impl AuditEvent {
    fn is_failure(&self) -> bool {
        matches!(self, AuditEvent::LoginFailed | AuditEvent::RevokeRejected)
    }
}

/// Log an operator action.
///
/// # Arguments
///
/// * `event` - What happened
/// * `subject` - The username, license id or publication uuid acted upon
/// * `details` - Optional additional details about the event
pub fn log_audit_event(event: AuditEvent, subject: &str, details: Option<&str>) {
    let span = info_span!("audit", event = %event, subject = %subject);
    let _enter = span.enter();

    match (event.is_failure(), details) {
        (true, Some(d)) => warn!(reason = %d, "Audit event"),
        (true, None) => warn!("Audit event"),
        (false, Some(d)) => info!(details = %d, "Audit event"),
        (false, None) => info!("Audit event"),
    }
}

/// Header name for the request ID.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Generate a new unique request ID.
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Logging middleware that tracks request timing and generates request IDs.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response<Body> {
    let request_id = generate_request_id();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    let start = Instant::now();

    let response = async move {
        info!("Started processing request");
        next.run(request).await
    }
    .instrument(span.clone())
    .await;

    let duration = start.elapsed();
    let status = response.status();

    span.in_scope(|| {
        info!(
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    });

    let (mut parts, body) = response.into_parts();
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        parts.headers.insert(REQUEST_ID_HEADER, header_value);
    }

    Response::from_parts(parts, body)
}

/// Health check response structure.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" while the process serves requests
    pub status: String,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
