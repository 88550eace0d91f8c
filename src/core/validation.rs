//! Validation utilities for configuration values
//!
//! Every check returns a user-actionable [`ValidationError`] so startup can
//! report the offending option verbatim.

use std::time::Duration;
use thiserror::Error;

/// A configuration value the user supplied (or omitted) that cannot be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl crate::core::error_handling::ContextualError for ValidationError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some(&self.message)
    }
}

/// Validate positive integer value
pub fn validate_positive_int(name: &str, value: usize) -> Result<usize, ValidationError> {
    if value == 0 {
        return Err(ValidationError::new(format!(
            "'{}' must be greater than 0",
            name
        )));
    }
    Ok(value)
}

/// Validate a duration expressed in whole seconds
pub fn validate_seconds(name: &str, value: u64) -> Result<Duration, ValidationError> {
    if value == 0 {
        return Err(ValidationError::new(format!(
            "'{}' must be at least 1 second",
            name
        )));
    }
    Ok(Duration::from_secs(value))
}

/// Validate and normalise the scanner base URL so it always ends in `/`
pub fn validate_base_url(url: &str) -> Result<String, ValidationError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(
            "Scanner URL is required (--url or 'url' in the configuration file)",
        ));
    }
    let Some((_, rest)) = trimmed
        .split_once("://")
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https"))
    else {
        return Err(ValidationError::new(format!(
            "Invalid scanner URL '{}'. Only http:// and https:// are supported",
            trimmed
        )));
    };
    if rest.trim_matches('/').is_empty() {
        return Err(ValidationError::new(format!(
            "Scanner URL '{}' has no host",
            trimmed
        )));
    }

    if trimmed.ends_with('/') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{}/", trimmed))
    }
}

/// Validate the API key is present
pub fn validate_api_key(key: &str) -> Result<String, ValidationError> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(
            "API key is required (--api-key or 'api-key' in the configuration file)",
        ));
    }
    Ok(trimmed.to_string())
}

/// Check for the 8-4-4-4-12 hex layout the scanner uses for identifiers
pub fn is_identifier(value: &str) -> bool {
    let groups: Vec<&str> = value.split('-').collect();
    let lengths = [8, 4, 4, 4, 12];
    groups.len() == lengths.len()
        && groups
            .iter()
            .zip(lengths)
            .all(|(group, len)| group.len() == len && group.chars().all(|c| c.is_ascii_hexdigit()))
}
