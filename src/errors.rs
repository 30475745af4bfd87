use thiserror::Error;

use crate::models::LicenseStatus;

/// Errors raised by the dashboard core and its store collaborators.
#[derive(Debug, Error)]
pub enum DashError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("license not found: {0}")]
    LicenseNotFound(String),

    #[error("publication not found: {0}")]
    PublicationNotFound(String),

    /// Revocation requested from a status that cannot reach `revoked`.
    #[error("license {license_id} cannot be revoked from status '{from}'")]
    InvalidStateTransition {
        license_id: String,
        from: LicenseStatus,
    },

    #[error("store error: {0}")]
    StoreError(String),

    #[error("server error: {0}")]
    ServerError(String),
}

pub type DashResult<T> = Result<T, DashError>;
