//! Shared-key request signing for the HTTP Data Collector API.
//!
//! The service recomputes the same HMAC on its side, so the canonical string has to
//! match byte for byte:
//!
//! ```text
//! {method}\n{content_length}\n{content_type}\nx-ms-date:{date}\n{resource}
//! ```
//!
//! The resulting header value is `SharedKey {workspace_id}:{base64(hmac_sha256)}`.

// Local crates
use crate::auth::credentials::SharedKey;
use crate::error::{LogAnalyticsError, Result};

// External crates
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::instrument;

type HmacSha256 = Hmac<Sha256>;

/// `x-ms-date` layout, RFC 1123 in GMT.
pub const RFC1123_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Format a timestamp the way `x-ms-date` expects it.
#[must_use]
pub fn rfc1123(at: DateTime<Utc>) -> String {
    at.format(RFC1123_FORMAT).to_string()
}

/// The request fields covered by the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// HTTP method, `POST` for ingestion.
    pub method: String,
    /// Body length in bytes.
    pub content_length: usize,
    /// Value of the `content-type` header.
    pub content_type: String,
    /// Value of the `x-ms-date` header, RFC 1123.
    pub date: String,
    /// Resource path, `/api/logs` for ingestion.
    pub resource: String,
}

impl SignedRequest {
    /// String the HMAC is computed over.
    #[must_use]
    pub fn canonical_string(&self) -> String {
        format!(
            "{}\n{}\n{}\nx-ms-date:{}\n{}",
            self.method, self.content_length, self.content_type, self.date, self.resource
        )
    }
}

/// Produces `SharedKey` authorization values for one workspace.
#[derive(Debug)]
pub struct Signer {
    workspace_id: String,
    key: SharedKey,
}

impl Signer {
    /// Create a signer for `workspace_id` using an already decoded key.
    pub fn new(workspace_id: impl Into<String>, key: SharedKey) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            key,
        }
    }

    /// Workspace the signatures are issued for.
    #[must_use]
    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    /// Authorization header value for `request`.
    ///
    /// Fails with a configuration error if the key is unusable as an HMAC key.
    #[instrument(
        name = "auth_signer::sign",
        target = "auth::signer",
        skip_all,
        level = "debug"
    )]
    pub fn sign(&self, request: &SignedRequest) -> Result<String> {
        let canonical = request.canonical_string();

        let mut mac = HmacSha256::new_from_slice(self.key.expose())
            .map_err(|e| LogAnalyticsError::config(format!("shared key rejected by HMAC: {e}")))?;
        mac.update(canonical.as_bytes());
        let digest = BASE64.encode(mac.finalize().into_bytes());

        tracing::debug!(
            method = %request.method,
            content_length = request.content_length,
            resource = %request.resource,
            signature_len = digest.len(),
            "Computed shared-key signature"
        );

        Ok(format!("SharedKey {}:{}", self.workspace_id, digest))
    }
}

/// One-shot form of [`Signer::sign`] taking the key still base64 encoded.
///
/// Fails with a configuration error when the key is not valid base64 or is empty.
pub fn build_signature(
    workspace_id: &str,
    base64_key: &str,
    date: &str,
    content_length: usize,
    method: &str,
    content_type: &str,
    resource: &str,
) -> Result<String> {
    let signer = Signer::new(workspace_id, SharedKey::from_base64(base64_key)?);
    signer.sign(&SignedRequest {
        method: method.to_owned(),
        content_length,
        content_type: content_type.to_owned(),
        date: date.to_owned(),
        resource: resource.to_owned(),
    })
}
