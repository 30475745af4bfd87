//! `POST /login`: exchange operator credentials for a session token.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AuthConfig;
use crate::server::api_error::{ApiError, ErrorCode};
use crate::server::auth::{Principal, SESSION_COOKIE};
use crate::server::handlers::AppState;
use crate::server::logging::{log_audit_event, AuditEvent};
use crate::server::validation::validate_present;

/// Presentation settings for the login response and session cookie.
#[derive(Debug, Clone)]
pub struct LoginSettings {
    pub cookie_secure: bool,
    pub profile_id: String,
    pub profile_email_domain: String,
}

impl LoginSettings {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            cookie_secure: config.cookie_secure,
            profile_id: config.profile_id.clone(),
            profile_email_domain: config.profile_email_domain.clone(),
        }
    }

    /// Public profile shown to the client after login.
    pub fn profile_for(&self, principal: &Principal) -> UserProfile {
        UserProfile {
            id: self.profile_id.clone(),
            email: format!("{}@{}", principal.username, self.profile_email_domain),
            name: principal.username.clone(),
        }
    }
}

impl Default for LoginSettings {
    fn default() -> Self {
        Self::from_config(&AuthConfig::default())
    }
}

/// Request body for `POST /login`.
///
/// Missing fields deserialize as empty strings so they are reported as
/// `MISSING_FIELD` rather than a generic parse failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Response body for `POST /login`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// Unix timestamp at which the token stops being accepted
    pub expires_at: u64,
    pub user: UserProfile,
}

fn session_cookie(token: String, ttl_secs: u64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .path("/")
        .max_age(time::Duration::seconds(
            i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        ))
        .build()
}

/// Handler for `POST /login`.
///
/// On success the token is returned in the body and also set as an
/// http-only `token` cookie.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(reason = %rejection.body_text(), "unreadable login body");
        ApiError::new(ErrorCode::InvalidRequest)
    })?;

    validate_present(&request.username, "username")?;
    validate_present(&request.password, "password")?;

    let principal = match state
        .credentials
        .verify(&request.username, &request.password)
        .await
    {
        Ok(principal) => principal,
        Err(err) => {
            log_audit_event(AuditEvent::LoginFailed, &request.username, Some(&err.to_string()));
            return Err(err.into());
        }
    };

    let issued = state.tokens.issue(&principal)?;
    log_audit_event(AuditEvent::LoginSucceeded, &principal.username, None);

    let cookie = session_cookie(
        issued.token.clone(),
        state.tokens.ttl_secs(),
        state.login.cookie_secure,
    );

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            user: state.login.profile_for(&principal),
        }),
    ))
}
