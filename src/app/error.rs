//! Errors that end a run

use thiserror::Error;

use crate::core::validation::ValidationError;
use crate::remote::error::RemoteError;

#[derive(Debug, Error)]
pub enum RunError {
    /// The connectivity probe failed; nothing was read or changed
    #[error("Cannot reach scanner API at {host}: {source}")]
    Connectivity {
        host: String,
        #[source]
        source: RemoteError,
    },
    #[error(transparent)]
    Configuration(#[from] ValidationError),
    #[error("Failed to set up the scanner client: {0}")]
    Client(#[source] RemoteError),
}

impl crate::core::error_handling::ContextualError for RunError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, RunError::Configuration(_))
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            RunError::Configuration(e) => Some(e.message()),
            _ => None,
        }
    }
}
