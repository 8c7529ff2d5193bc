// Local crates
use crate::error::{LogAnalyticsError, Result};
use crate::helpers::load_config::HttpConfig;

// External crates
use reqwest::Client;
use std::time::Duration;

/// `User-Agent` sent on every outbound request.
pub const USER_AGENT: &str = concat!("log-analytics/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by the token, ingestion and query calls.
///
/// Every request gets a bounded deadline from `config`.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .build()
        .map_err(|e| LogAnalyticsError::config(format!("failed to build HTTP client: {e}")))
}

/// Map a `reqwest` failure that happened before a response was received.
pub(crate) fn transport_error(e: &reqwest::Error) -> LogAnalyticsError {
    let message = if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    };
    LogAnalyticsError::Transport {
        status: e.status().map(|s| s.as_u16()),
        message,
    }
}
