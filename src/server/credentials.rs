//! Operator credential verification.

use axum::async_trait;

use crate::config::AuthConfig;
use crate::server::auth::{AuthError, Principal};

/// Source of trusted operator identities.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Check a username/password pair, returning the matching principal.
    async fn verify(&self, username: &str, password: &str) -> Result<Principal, AuthError>;
}

/// A single operator identity taken from configuration.
#[derive(Clone)]
pub struct StaticCredentials {
    username: String,
    password: String,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.admin_username, &config.admin_password)
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentials {
    async fn verify(&self, username: &str, password: &str) -> Result<Principal, AuthError> {
        if username == self.username && password == self.password {
            Ok(Principal::new(username))
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}
