//! Request validation utilities.
//!
//! Used for login payloads and for identifiers bound from URL paths.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Longest identifier accepted in a path segment.
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validation error type.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    /// The field was absent or empty rather than malformed.
    pub missing: bool,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._@:+-]+$").expect("identifier pattern is a valid regex")
    })
}

/// Validate that a string is not empty or whitespace-only.
pub fn validate_not_empty(value: &str, field_name: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        Err(ValidationError {
            field: field_name.to_string(),
            message: "cannot be empty".to_string(),
            missing: true,
        })
    } else {
        Ok(())
    }
}

/// Validate that a field was supplied at all.
///
/// Unlike [`validate_not_empty`] whitespace counts as a value, so a blank
/// password still reaches credential verification.
pub fn validate_present(value: &str, field_name: &str) -> ValidationResult<()> {
    if value.is_empty() {
        Err(ValidationError {
            field: field_name.to_string(),
            message: "cannot be empty".to_string(),
            missing: true,
        })
    } else {
        Ok(())
    }
}

/// Validate string length is within bounds.
pub fn validate_length(value: &str, field_name: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        Err(ValidationError {
            field: field_name.to_string(),
            message: format!("must be at most {max} characters"),
            missing: false,
        })
    } else {
        Ok(())
    }
}

/// Validate a key used only to look records up.
///
/// Any non-empty value up to [`MAX_IDENTIFIER_LENGTH`] characters is accepted;
/// a key matching nothing simply yields an empty result.
pub fn validate_lookup_key(value: &str, field_name: &str) -> ValidationResult<()> {
    validate_present(value, field_name)?;
    validate_length(value, field_name, MAX_IDENTIFIER_LENGTH)
}

/// Validate a license or publication identifier targeted by a mutation.
///
/// Identifiers are non-empty, at most [`MAX_IDENTIFIER_LENGTH`] characters and
/// drawn from `[A-Za-z0-9._@:+-]` so that emails and UUIDs pass.
///
/// # Example
/// ```
/// use lcp_dashboard::server::validation::validate_identifier;
///
/// assert!(validate_identifier("license-001-user123", "license_id").is_ok());
/// assert!(validate_identifier("john.doe@example.com", "user_id").is_ok());
/// assert!(validate_identifier("a b", "user_id").is_err());
/// ```
pub fn validate_identifier(value: &str, field_name: &str) -> ValidationResult<()> {
    validate_not_empty(value, field_name)?;
    validate_length(value, field_name, MAX_IDENTIFIER_LENGTH)?;

    if identifier_pattern().is_match(value) {
        Ok(())
    } else {
        Err(ValidationError {
            field: field_name.to_string(),
            message: "contains unsupported characters".to_string(),
            missing: false,
        })
    }
}
