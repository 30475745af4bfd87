//! Session tokens and the authentication gate for dashboard routes.
//!
//! A successful login yields an HS256 JWT whose `sub` claim is the operator's
//! username. Tokens are self-contained: the server keeps no session table, so
//! any instance holding the same secret can verify them.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lcp_dashboard::server::auth::{require_session, Principal};
//!
//! let protected = Router::new()
//!     .route("/dashboard/data", get(handler))
//!     .route_layer(middleware::from_fn_with_state(state.clone(), require_session));
//!
//! async fn handler(principal: Principal) -> impl IntoResponse {
//!     format!("Hello, {}!", principal.username)
//! }
//! ```
//!
//! # Token transport
//!
//! The gate reads `Authorization: Bearer <token>` first and falls back to the
//! `token` cookie set by `POST /login`.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::errors::{DashError, DashResult};
use crate::server::api_error::{ApiError, ErrorCode};
use crate::server::handlers::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the authenticated username
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Not before (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
}

/// The authenticated identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
}

impl Principal {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// A freshly minted session token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: u64,
    pub expires_at: u64,
}

/// Authentication errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Username/password pair did not match
    InvalidCredentials,
    /// Neither bearer header nor cookie present
    MissingToken,
    /// Authorization header is not readable text
    InvalidHeader,
    /// Token could not be decoded
    MalformedToken(String),
    /// Signature does not match the server key
    InvalidSignature,
    /// Algorithm, key or intended audience cannot be verified here
    UnverifiableToken(String),
    /// Token has expired
    TokenExpired,
    /// Token is not valid yet
    TokenNotYetValid,
}

impl AuthError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AuthError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AuthError::MissingToken => ErrorCode::MissingToken,
            AuthError::InvalidHeader => ErrorCode::InvalidHeader,
            AuthError::MalformedToken(_) => ErrorCode::MalformedToken,
            AuthError::InvalidSignature => ErrorCode::InvalidSignature,
            AuthError::UnverifiableToken(_) => ErrorCode::UnverifiableToken,
            AuthError::TokenExpired => ErrorCode::TokenExpired,
            AuthError::TokenNotYetValid => ErrorCode::TokenNotYetValid,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "invalid credentials"),
            AuthError::MissingToken => write!(f, "missing session token"),
            AuthError::InvalidHeader => write!(f, "invalid authorization header"),
            AuthError::MalformedToken(msg) => write!(f, "malformed token: {msg}"),
            AuthError::InvalidSignature => write!(f, "invalid token signature"),
            AuthError::UnverifiableToken(msg) => write!(f, "unverifiable token: {msg}"),
            AuthError::TokenExpired => write!(f, "token has expired"),
            AuthError::TokenNotYetValid => write!(f, "token is not valid yet"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        // Decoder detail stays in the log, never in the response.
        ApiError::new(err.code())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
        ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidKeyFormat
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience => AuthError::UnverifiableToken(err.to_string()),
        _ => AuthError::MalformedToken(err.to_string()),
    }
}

/// Current time as a Unix timestamp.
pub fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

/// Issues and verifies session tokens with the process-wide secret.
///
/// Built once at startup and shared read-only through `AppState`.
#[derive(Clone)]
pub struct SessionTokens {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    ttl_secs: u64,
}

impl SessionTokens {
    /// Create the token service from auth configuration.
    pub fn from_config(config: &AuthConfig) -> DashResult<Self> {
        if config.jwt_secret.is_empty() {
            return Err(DashError::ConfigError(
                "jwt_secret is required for session tokens".to_string(),
            ));
        }

        // Resolve secret (support env: prefix for environment variable)
        let secret = if let Some(env_var) = config.jwt_secret.strip_prefix("env:") {
            std::env::var(env_var).map_err(|_| {
                DashError::ConfigError(format!(
                    "environment variable '{env_var}' not found for jwt_secret"
                ))
            })?
        } else {
            config.jwt_secret.clone()
        };

        // Lifetime checks run in `validate_at` so expiry is exact and testable.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.jwt_issuer]);
        validation.set_audience(&[&config.jwt_audience]);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            ttl_secs: config.token_ttl_secs,
        })
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Mint a token for `principal`, valid from now for the configured TTL.
    pub fn issue(&self, principal: &Principal) -> DashResult<IssuedToken> {
        self.issue_at(principal, unix_now())
    }

    /// Mint a token as if the current time were `now`.
    pub fn issue_at(&self, principal: &Principal, now: u64) -> DashResult<IssuedToken> {
        let claims = Claims {
            sub: principal.username.clone(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
            nbf: None,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| DashError::ServerError(format!("failed to sign session token: {e}")))?;

        Ok(IssuedToken {
            token,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    /// Verify a token against the current time.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_at(token, unix_now())
    }

    /// Verify signature, structure and lifetime of `token` at instant `now`.
    ///
    /// A token is expired from the instant `exp` onward.
    pub fn validate_at(&self, token: &str, now: u64) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(classify)?
            .claims;

        if now >= claims.exp {
            return Err(AuthError::TokenExpired);
        }

        if let Some(nbf) = claims.nbf {
            if now < nbf {
                return Err(AuthError::TokenNotYetValid);
            }
        }

        Ok(claims)
    }

    /// Run the full gate over request headers.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let token = extract_token(headers)?;
        let claims = self.validate(&token)?;
        Ok(Principal::new(claims.sub))
    }
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

/// Pull the candidate token from the request.
///
/// A `Bearer` authorization header wins. Any other scheme, or an empty bearer
/// value, falls through to the session cookie.
pub fn extract_token(headers: &HeaderMap) -> Result<String, AuthError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value.to_str().map_err(|_| AuthError::InvalidHeader)?;
        if let Some((scheme, token)) = value.split_once(' ') {
            let token = token.trim();
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
                return Ok(token.to_string());
            }
        }
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// Middleware guarding every protected route.
///
/// On success the `Principal` is stored in the request extensions; on failure
/// the request is answered here and the inner handler never runs.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.tokens.authenticate(request.headers()) {
        Ok(principal) => {
            debug!(username = %principal.username, "session accepted");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(err) => {
            warn!(code = ?err.code(), reason = %err, "session rejected");
            err.into_response()
        }
    }
}

/// Handlers behind `require_session` take the caller as an argument.
#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}
