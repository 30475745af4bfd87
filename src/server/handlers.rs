//! Shared state and the `/dashboard/*` handlers.
//!
//! Every handler here sits behind `require_session`, so each takes the
//! authenticated `Principal` and logs who asked.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::request::Parts,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DashConfig;
use crate::errors::{DashError, DashResult};
use crate::models::{
    DashboardSnapshot, LicenseRecord, OversharedLicense, Page, Publication, RevokeOutcome,
    UsageEvent,
};
use crate::server::api_error::ApiError;
use crate::server::auth::{Principal, SessionTokens};
use crate::server::credentials::{CredentialVerifier, StaticCredentials};
use crate::server::logging::{log_audit_event, AuditEvent, HealthResponse};
use crate::server::login::LoginSettings;
use crate::server::pagination::Pagination;
use crate::server::store::{DashboardStore, InMemoryStore};
use crate::server::validation::{validate_identifier, validate_lookup_key};

/// Shared application state for handlers.
///
/// Everything is behind `Arc` and built once at startup; cloning per request
/// only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<SessionTokens>,
    pub credentials: Arc<dyn CredentialVerifier>,
    pub store: Arc<dyn DashboardStore>,
    pub login: Arc<LoginSettings>,
}

impl AppState {
    pub fn new(
        tokens: SessionTokens,
        credentials: Arc<dyn CredentialVerifier>,
        store: Arc<dyn DashboardStore>,
        login: LoginSettings,
    ) -> Self {
        Self {
            tokens: Arc::new(tokens),
            credentials,
            store,
            login: Arc::new(login),
        }
    }

    /// Build the state from configuration, seeding the in-memory store.
    pub fn from_config(config: &DashConfig) -> DashResult<Self> {
        let tokens = SessionTokens::from_config(&config.auth)?;
        let store = InMemoryStore::with_sample_data(
            config.dashboard.oversharing_device_limit,
            Utc::now(),
        );

        Ok(Self::new(
            tokens,
            Arc::new(StaticCredentials::from_config(&config.auth)),
            Arc::new(store),
            LoginSettings::from_config(&config.auth),
        ))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tokens", &self.tokens)
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

/// A single path parameter whose rejection is the JSON error envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParam(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for PathParam
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<String>::from_request_parts(parts, state).await?;
        Ok(PathParam(value))
    }
}

/// Response body for `PUT /dashboard/revoke/:license_id`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RevokeLicenseResponse {
    pub success: bool,
    pub message: String,
    pub license_id: String,
}

/// Response body for `DELETE /dashboard/publications/:uuid`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeletePublicationResponse {
    pub success: bool,
    pub message: String,
    pub uuid: String,
}

/// `GET /dashboard/data`
pub async fn dashboard_data_handler(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<DashboardSnapshot>, ApiError> {
    debug!(username = %principal.username, "dashboard snapshot requested");
    Ok(Json(state.store.snapshot().await?))
}

/// `GET /dashboard/overshared`
pub async fn overshared_handler(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<OversharedLicense>>, ApiError> {
    debug!(username = %principal.username, "overshared licenses requested");
    Ok(Json(state.store.overshared_licenses().await?))
}

/// `GET /dashboard/user-licenses/:user_id`
///
/// An unknown user yields an empty list, not an error.
pub async fn user_licenses_handler(
    State(state): State<AppState>,
    principal: Principal,
    PathParam(user_id): PathParam,
) -> Result<Json<Vec<LicenseRecord>>, ApiError> {
    validate_lookup_key(&user_id, "user_id")?;
    debug!(username = %principal.username, user_id = %user_id, "user licenses requested");
    Ok(Json(state.store.user_licenses(&user_id).await?))
}

/// `GET /dashboard/license-events/:license_id`
pub async fn license_events_handler(
    State(state): State<AppState>,
    principal: Principal,
    PathParam(license_id): PathParam,
) -> Result<Json<Vec<UsageEvent>>, ApiError> {
    validate_lookup_key(&license_id, "license_id")?;
    debug!(
        username = %principal.username,
        license_id = %license_id,
        "license events requested"
    );
    Ok(Json(state.store.license_events(&license_id).await?))
}

/// `GET /dashboard/publications?page=&per_page=`
pub async fn publications_handler(
    State(state): State<AppState>,
    principal: Principal,
    pagination: Pagination,
) -> Result<Json<Page<Publication>>, ApiError> {
    debug!(
        username = %principal.username,
        page = pagination.page,
        per_page = pagination.per_page,
        "publications requested"
    );
    Ok(Json(state.store.publications(pagination).await?))
}

/// `DELETE /dashboard/publications/:uuid`
pub async fn delete_publication_handler(
    State(state): State<AppState>,
    principal: Principal,
    PathParam(uuid): PathParam,
) -> Result<Json<DeletePublicationResponse>, ApiError> {
    validate_identifier(&uuid, "uuid")?;
    state.store.delete_publication(&uuid).await?;

    log_audit_event(
        AuditEvent::PublicationDeleted,
        &uuid,
        Some(&format!("by {}", principal.username)),
    );

    Ok(Json(DeletePublicationResponse {
        success: true,
        message: "Publication deleted".to_string(),
        uuid,
    }))
}

/// `PUT /dashboard/revoke/:license_id`
///
/// Behavior:
/// - `ready` / `active` licenses move to `revoked`.
/// - An already revoked license is reported as a success without change.
/// - Any other status is a `409`, an unknown id a `404`.
pub async fn revoke_license_handler(
    State(state): State<AppState>,
    principal: Principal,
    PathParam(license_id): PathParam,
) -> Result<Json<RevokeLicenseResponse>, ApiError> {
    validate_identifier(&license_id, "license_id")?;
    info!(username = %principal.username, license_id = %license_id, "Revoke request");

    let outcome = match state.store.revoke_license(&license_id).await {
        Ok(outcome) => outcome,
        Err(err @ DashError::InvalidStateTransition { .. }) => {
            log_audit_event(AuditEvent::RevokeRejected, &license_id, Some(&err.to_string()));
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    let message = match outcome {
        RevokeOutcome::Revoked => {
            log_audit_event(
                AuditEvent::LicenseRevoked,
                &license_id,
                Some(&format!("by {}", principal.username)),
            );
            "License revocation was successful"
        }
        RevokeOutcome::AlreadyRevoked => "License was already revoked",
    };

    Ok(Json(RevokeLicenseResponse {
        success: true,
        message: message.to_string(),
        license_id,
    }))
}

/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Fallback for unknown routes.
pub async fn not_found_handler() -> ApiError {
    ApiError::not_found()
}
