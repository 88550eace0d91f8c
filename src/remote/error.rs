//! Remote Service Error Types

use thiserror::Error;

/// Failures talking to the scanner API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The HTTP client could not be constructed
    #[error("Failed to create HTTP client: {reason}")]
    ClientBuild { reason: String },
    /// The request never produced a response (DNS, TLS, timeout, reset)
    #[error("Request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },
    /// The scanner answered with a status the operation does not accept
    #[error("{endpoint} returned HTTP {status}")]
    UnexpectedStatus { endpoint: String, status: u16 },
    /// The body could not be parsed
    #[error("Failed to decode response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

impl RemoteError {
    pub fn transport(endpoint: &str, cause: impl std::fmt::Display) -> Self {
        RemoteError::Transport {
            endpoint: endpoint.to_string(),
            reason: cause.to_string(),
        }
    }

    pub fn decode(endpoint: &str, cause: impl std::fmt::Display) -> Self {
        RemoteError::Decode {
            endpoint: endpoint.to_string(),
            reason: cause.to_string(),
        }
    }
}

impl crate::core::error_handling::ContextualError for RemoteError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;
