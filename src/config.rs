//! Configuration system for the dashboard server.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `config.toml` file
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `LCPDASH_SERVER_HOST` - Server bind address
//! - `LCPDASH_SERVER_PORT` - Server port
//! - `LCPDASH_JWT_SECRET` - Secret key for signing session tokens
//! - `LCPDASH_JWT_ISSUER` - JWT issuer claim
//! - `LCPDASH_JWT_AUDIENCE` - JWT audience claim
//! - `LCPDASH_TOKEN_TTL_SECS` - Session token lifetime in seconds
//! - `LCPDASH_COOKIE_SECURE` - Mark the session cookie `Secure`
//! - `LCPDASH_ADMIN_USERNAME` - Operator login name
//! - `LCPDASH_ADMIN_PASSWORD` - Operator password
//! - `LCPDASH_LOGGING_ENABLED` - Enable the tracing subscriber
//! - `LCPDASH_LOG_LEVEL` - Log level (trace, debug, info, warn, error)
//! - `LCPDASH_OVERSHARING_LIMIT` - Devices a license may use before it is flagged

use config::Config;
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;

use crate::errors::{DashError, DashResult};

/// Global configuration singleton.
static CONFIG: OnceLock<DashConfig> = OnceLock::new();

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    pub dashboard: DashboardConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8989,
        }
    }
}

/// Session token and operator identity configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 secret (use `env:VAR_NAME` to read from environment)
    pub jwt_secret: String,
    /// JWT issuer claim (iss)
    pub jwt_issuer: String,
    /// JWT audience claim (aud)
    pub jwt_audience: String,
    /// Session token lifetime in seconds (default: 1 hour)
    pub token_ttl_secs: u64,
    /// Whether the session cookie is flagged `Secure`
    pub cookie_secure: bool,
    /// Operator login name
    pub admin_username: String,
    /// Operator password
    pub admin_password: String,
    /// Profile id returned to the client after login
    pub profile_id: String,
    /// Domain used to build the profile email
    pub profile_email_domain: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: "lcp-dashboard".to_string(),
            jwt_audience: "lcp-dashboard-api".to_string(),
            token_ttl_secs: 3600,
            cookie_secure: false,
            admin_username: "admin".to_string(),
            admin_password: "supersecret".to_string(),
            profile_id: "1".to_string(),
            profile_email_domain: "example.com".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
        }
    }
}

/// Dashboard data policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// A license using more devices than this is reported as overshared
    pub oversharing_device_limit: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            oversharing_device_limit: 2,
        }
    }
}

fn config_err(e: config::ConfigError) -> DashError {
    DashError::ConfigError(e.to_string())
}

impl DashConfig {
    /// Load configuration from file and environment.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. `config.toml` file (optional)
    /// 3. Environment variables
    pub fn load() -> DashResult<Self> {
        let builder = Config::builder()
            .set_default("server.host", "127.0.0.1")
            .map_err(config_err)?
            .set_default("server.port", 8989)
            .map_err(config_err)?
            .set_default("auth.jwt_secret", "")
            .map_err(config_err)?
            .set_default("auth.jwt_issuer", "lcp-dashboard")
            .map_err(config_err)?
            .set_default("auth.jwt_audience", "lcp-dashboard-api")
            .map_err(config_err)?
            .set_default("auth.token_ttl_secs", 3600)
            .map_err(config_err)?
            .set_default("auth.cookie_secure", false)
            .map_err(config_err)?
            .set_default("auth.admin_username", "admin")
            .map_err(config_err)?
            .set_default("auth.admin_password", "supersecret")
            .map_err(config_err)?
            .set_default("auth.profile_id", "1")
            .map_err(config_err)?
            .set_default("auth.profile_email_domain", "example.com")
            .map_err(config_err)?
            .set_default("logging.enabled", true)
            .map_err(config_err)?
            .set_default("logging.level", "info")
            .map_err(config_err)?
            .set_default("dashboard.oversharing_device_limit", 2)
            .map_err(config_err)?
            // Load from config.toml (optional)
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables
            .set_override_option("server.host", env::var("LCPDASH_SERVER_HOST").ok())
            .map_err(config_err)?
            .set_override_option(
                "server.port",
                env::var("LCPDASH_SERVER_PORT")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok()),
            )
            .map_err(config_err)?
            .set_override_option("auth.jwt_secret", env::var("LCPDASH_JWT_SECRET").ok())
            .map_err(config_err)?
            .set_override_option("auth.jwt_issuer", env::var("LCPDASH_JWT_ISSUER").ok())
            .map_err(config_err)?
            .set_override_option("auth.jwt_audience", env::var("LCPDASH_JWT_AUDIENCE").ok())
            .map_err(config_err)?
            .set_override_option(
                "auth.token_ttl_secs",
                env::var("LCPDASH_TOKEN_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok()),
            )
            .map_err(config_err)?
            .set_override_option(
                "auth.cookie_secure",
                env::var("LCPDASH_COOKIE_SECURE")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok()),
            )
            .map_err(config_err)?
            .set_override_option(
                "auth.admin_username",
                env::var("LCPDASH_ADMIN_USERNAME").ok(),
            )
            .map_err(config_err)?
            .set_override_option(
                "auth.admin_password",
                env::var("LCPDASH_ADMIN_PASSWORD").ok(),
            )
            .map_err(config_err)?
            .set_override_option(
                "logging.enabled",
                env::var("LCPDASH_LOGGING_ENABLED")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok()),
            )
            .map_err(config_err)?
            .set_override_option("logging.level", env::var("LCPDASH_LOG_LEVEL").ok())
            .map_err(config_err)?
            .set_override_option(
                "dashboard.oversharing_device_limit",
                env::var("LCPDASH_OVERSHARING_LIMIT")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok()),
            )
            .map_err(config_err)?;

        let settings = builder
            .build()
            .map_err(|e| DashError::ConfigError(format!("failed to build config: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| DashError::ConfigError(format!("failed to deserialize config: {e}")))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> DashResult<()> {
        if self.server.port == 0 {
            return Err(DashError::ConfigError(
                "server.port must be greater than 0".to_string(),
            ));
        }

        if self.auth.jwt_secret.is_empty() {
            return Err(DashError::ConfigError(
                "auth.jwt_secret is required (set LCPDASH_JWT_SECRET)".to_string(),
            ));
        }

        if self.auth.token_ttl_secs == 0 {
            return Err(DashError::ConfigError(
                "auth.token_ttl_secs must be greater than 0".to_string(),
            ));
        }

        if self.auth.admin_username.is_empty() || self.auth.admin_password.is_empty() {
            return Err(DashError::ConfigError(
                "auth.admin_username and auth.admin_password cannot be empty".to_string(),
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(DashError::ConfigError(format!(
                    "logging.level must be one of: trace, debug, info, warn, error. Got '{other}'"
                )));
            }
        }

        Ok(())
    }
}

/// Get the global configuration.
///
/// This loads the configuration on first access and caches it.
/// Returns an error if configuration loading or validation fails.
pub fn get_config() -> DashResult<&'static DashConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let config = DashConfig::load()?;
    config.validate()?;

    // Another thread may have won the race; either value is equivalent.
    let _ = CONFIG.set(config);

    CONFIG
        .get()
        .ok_or_else(|| DashError::ConfigError("configuration was not initialised".to_string()))
}

/// Initialize configuration explicitly.
///
/// Call this early in your application to catch configuration errors.
pub fn init_config() -> DashResult<&'static DashConfig> {
    get_config()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> DashConfig {
        DashConfig {
            auth: AuthConfig {
                jwt_secret: "unit-test-secret".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = DashConfig::default();
        assert_eq!(config.server.port, 8989);
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.auth.admin_username, "admin");
        assert_eq!(config.dashboard.oversharing_device_limit, 2);
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let config = DashConfig::default();
        assert!(matches!(config.validate(), Err(DashError::ConfigError(_))));
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let mut config = valid_config();
        config.auth.token_ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let mut config = valid_config();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }
}
