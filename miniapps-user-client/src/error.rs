//! Error taxonomy for client construction and profile fetches.

use reqwest::StatusCode;

/// Fallback used when a failure carries no description of its own.
pub(crate) const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// Construction-time failures. These are the only errors the crate raises
/// eagerly; every call-time failure is returned as a [`FetchError`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API token is required")]
    MissingToken,

    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Normalized outcome for every failed fetch.
///
/// The `Display` string is the user-facing error message. Timeouts and
/// missing-input failures use fixed literals so callers can branch on the
/// variant or the message interchangeably.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// The caller passed an empty user id; no request was issued.
    #[error("User ID is required")]
    MissingUserId,

    /// The cancellation timer fired before the call settled.
    #[error("Request timeout")]
    Timeout,

    /// Non-2xx response. `message` is the server-provided message when the
    /// body carried one, otherwise a synthesized `HTTP <status>: <reason>`.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// 2xx response whose envelope reported a non-success outcome.
    #[error("{message}")]
    Rejected { message: String },

    /// DNS, connection, or TLS failure before a response arrived.
    #[error("{0}")]
    Transport(String),

    /// The response body could not be parsed.
    #[error("{0}")]
    Decode(String),
}

impl FetchError {
    /// Normalize a transport-level failure, preserving timeout identity.
    pub(crate) fn transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        let message = err.to_string();
        if message.is_empty() {
            Self::Transport(UNKNOWN_ERROR.to_string())
        } else {
            Self::Transport(message)
        }
    }
}
