//! OAuth2 client-credentials exchange against the directory authority.
//!
//! A fresh token is requested on every invocation and nothing is cached.

// Local crates
use crate::auth::credentials::Credentials;
use crate::client::http::transport_error;
use crate::error::{LogAnalyticsError, Result};
use crate::metrics::metrics::{Operation, observe_request};

// External crates
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::time::Instant;
use tracing::instrument;

/// Short-lived bearer token. Expiry is not tracked.
pub struct BearerToken(SecretString);

impl BearerToken {
    /// Wrap a raw access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Raw token for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

/// Error body returned by the authority on a failed grant.
#[derive(Debug, Deserialize)]
struct AuthorityError {
    error: Option<String>,
    error_description: Option<String>,
}

/// Exchanges service principal credentials for bearer tokens.
#[derive(Debug, Clone)]
pub struct TokenProvider {
    client: Client,
}

impl TokenProvider {
    /// Create a provider sending through `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Token for `resource`, using the authority named in `credentials`.
    pub async fn token_for(&self, credentials: &Credentials, resource: &str) -> Result<BearerToken> {
        self.get_token(
            credentials.authority()?,
            resource,
            &credentials.tenant_id,
            &credentials.client_id,
            &credentials.client_secret,
        )
        .await
    }

    /// POST a client-credentials grant to `{authority}/{tenant_id}/oauth2/token`.
    ///
    /// Transport failures, non-2xx statuses and non-JSON bodies are
    /// authentication errors; a JSON body without `access_token` is a malformed
    /// response.
    #[instrument(
        name = "auth_token::get_token",
        target = "auth::token",
        skip_all,
        fields(tenant_id = %tenant_id, client_id = %client_id),
        level = "debug"
    )]
    pub async fn get_token(
        &self,
        authority: &str,
        resource: &str,
        tenant_id: &str,
        client_id: &str,
        client_secret: &SecretString,
    ) -> Result<BearerToken> {
        let url = format!("{}/{}/oauth2/token", authority.trim_end_matches('/'), tenant_id);
        tracing::debug!(token_endpoint = %url, resource = %resource, "Requesting bearer token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret.expose_secret()),
            ("resource", resource),
        ];

        let start = Instant::now();
        let response = match self.client.post(&url).form(&form).send().await {
            Ok(r) => r,
            Err(e) => {
                observe_request(Operation::Token, start, None);
                tracing::error!(error = %e, "Token request failed before a response arrived");
                return Err(LogAnalyticsError::authentication(
                    transport_error(&e).to_string(),
                ));
            }
        };

        let status = response.status();
        let body = response.text().await;
        observe_request(Operation::Token, start, Some(status.as_u16()));
        let body = body.map_err(|e| {
            LogAnalyticsError::authentication(format!("failed to read token response: {e}"))
        })?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<AuthorityError>(&body) {
                Ok(AuthorityError {
                    error_description: Some(desc),
                    ..
                }) => desc,
                Ok(AuthorityError {
                    error: Some(code), ..
                }) => code,
                _ => body,
            };
            tracing::error!(status = status.as_u16(), "Authority rejected client credentials grant");
            return Err(LogAnalyticsError::authentication(format!(
                "token endpoint returned HTTP {}: {detail}",
                status.as_u16()
            )));
        }

        let value: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            LogAnalyticsError::authentication(format!("token response is not valid JSON: {e}"))
        })?;

        match value.get("access_token").and_then(serde_json::Value::as_str) {
            Some(token) => {
                tracing::debug!(token_len = token.len(), "Bearer token acquired");
                Ok(BearerToken::new(token))
            }
            None => Err(LogAnalyticsError::malformed(
                "token response has no access_token",
            )),
        }
    }
}
