//! Error types shared by the ingestion and query pipelines.
//!
//! Nothing in this crate recovers locally: every error is raised straight up to
//! the binary, which prints it and exits non-zero.

/// Result type alias using [`LogAnalyticsError`].
pub type Result<T> = std::result::Result<T, LogAnalyticsError>;

/// Errors raised while authenticating, sending or interpreting requests.
#[derive(Debug, thiserror::Error)]
pub enum LogAnalyticsError {
    /// Missing or invalid auth file, shared key, option or configuration file.
    #[error("configuration error: {0}")]
    Config(String),

    /// The client-credentials exchange did not produce a usable token.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network failure, or a non-2xx status no client handles specifically.
    #[error("transport error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// Error detail or response body.
        message: String,
    },

    /// The query endpoint reported a structured failure.
    #[error("query failed with HTTP {status}: {message}")]
    Query {
        /// HTTP status returned by the query endpoint.
        status: u16,
        /// `error.message` from the response, or the raw body.
        message: String,
    },

    /// A response did not have the expected JSON shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Unusable user input: empty KQL text, a row with the wrong field count.
    #[error("invalid input: {0}")]
    Input(String),
}

impl LogAnalyticsError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication error.
    #[must_use]
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a malformed response error.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create an input error.
    #[must_use]
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            Self::Query { status, .. } => Some(*status),
            _ => None,
        }
    }
}
