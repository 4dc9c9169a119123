//! Routing error types.

use std::time::Duration;

use thiserror::Error;

use crate::core::BackendKind;

/// Result type for routing operations.
pub type RouteResult<T> = Result<T, RouteError>;

/// Errors that can occur while routing a command.
#[derive(Debug, Error)]
pub enum RouteError {
    /// No target matched the requested name.
    #[error("Terminal '{name}' not found")]
    NotFound { name: String, suggestions: Vec<String> },

    /// No adapter is registered for the target's backend.
    #[error("Unsupported terminal type for {target}: {kind}")]
    Unsupported { target: String, kind: BackendKind },

    /// The adapter reported a delivery failure.
    #[error("Failed to send to {target}: {detail}")]
    DispatchFailed { target: String, detail: String },

    /// The adapter did not answer in time.
    #[error("Timed out sending to {target} after {} seconds", .timeout.as_secs())]
    Timeout { target: String, timeout: Duration },

    /// Raw text was aimed at the local shell.
    #[error("Cannot send raw text to the local terminal")]
    LocalTextTarget,
}

impl RouteError {
    /// Suggestions attached to a not-found error.
    pub fn suggestions(&self) -> &[String] {
        match self {
            Self::NotFound { suggestions, .. } => suggestions,
            _ => &[],
        }
    }
}
