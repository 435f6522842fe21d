// ── Core error types ──
//
// Errors surfaced by the sync session. HTTP details are folded into a
// small taxonomy: the request never completed, the response could not
// be understood, or the service rejected a specific command.

use thiserror::Error;

use crate::command::CommandStatus;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Delivery errors ──────────────────────────────────────────────
    /// The request did not produce a response. Local state is untouched
    /// and the command queue still holds every pending command.
    #[error("Transport failure: {message}")]
    Transport { message: String, retryable: bool },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The service answered with a non-success HTTP status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Response errors ──────────────────────────────────────────────
    /// The response body was not a sync payload. Nothing was applied.
    #[error("Malformed sync response: {message}")]
    MalformedResponse { message: String },

    /// A committed command was rejected. Carries the first failing
    /// command in submission order.
    #[error("Command {token} rejected: {status}")]
    SyncStatus {
        token: String,
        status: CommandStatus,
    },

    // ── Caller errors ────────────────────────────────────────────────
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    // ── Local errors ─────────────────────────────────────────────────
    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether the failed request may simply be sent again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { retryable, .. } => *retryable,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether the failure happened before any response was decoded.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::AuthenticationFailed { .. } | Self::Api { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<todosync_api::Error> for CoreError {
    fn from(err: todosync_api::Error) -> Self {
        let retryable = err.is_transient();
        match err {
            todosync_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            todosync_api::Error::Http { status, body } => CoreError::Api {
                status,
                message: body,
            },
            todosync_api::Error::Deserialization { message, .. } => {
                CoreError::MalformedResponse { message }
            }
            todosync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid endpoint URL: {e}"),
            },
            todosync_api::Error::Encoding(e) => CoreError::Internal(format!("encoding failed: {e}")),
            other @ (todosync_api::Error::Transport(_)
            | todosync_api::Error::Timeout { .. }
            | todosync_api::Error::Tls(_)) => CoreError::Transport {
                message: other.to_string(),
                retryable,
            },
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Internal(format!("JSON encoding failed: {err}"))
    }
}
