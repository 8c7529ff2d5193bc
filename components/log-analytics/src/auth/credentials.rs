// Local crates
use crate::error::{LogAnalyticsError, Result};

// External crates
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use secrecy::{ExposeSecret, SecretBox, SecretString};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::instrument;

/// Service principal credentials read from an `--sdk-auth` style JSON file.
///
/// Loaded once per invocation and never mutated. The client secret stays wrapped
/// so it cannot end up in `Debug` output or logs.
#[derive(Debug)]
pub struct Credentials {
    /// Directory (tenant) id.
    pub tenant_id: String,
    /// Application (client) id.
    pub client_id: String,
    /// Client secret.
    pub client_secret: SecretString,
    /// `activeDirectoryEndpointUrl`, the token authority.
    pub active_directory_endpoint: Option<String>,
    /// `resourceManagerEndpointUrl`, informational only.
    pub resource_manager_endpoint: Option<String>,
}

/// Wire shape of the auth file. Unknown keys are ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthFile {
    tenant_id: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    active_directory_endpoint_url: Option<String>,
    resource_manager_endpoint_url: Option<String>,
}

impl Credentials {
    /// Read and validate the auth file at `path`.
    #[instrument(
        name = "auth_credentials::load",
        target = "auth::credentials",
        skip_all,
        level = "debug"
    )]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        tracing::debug!(auth_file = %path_ref.display(), "Loading service principal auth file");

        let raw = std::fs::read_to_string(path_ref).map_err(|e| {
            LogAnalyticsError::config(format!(
                "failed to read auth file {}: {e}",
                path_ref.display()
            ))
        })?;

        Self::from_json(&raw).map_err(|e| match e {
            LogAnalyticsError::Config(msg) => {
                LogAnalyticsError::config(format!("{}: {msg}", path_ref.display()))
            }
            other => other,
        })
    }

    /// Parse credentials from the JSON text of an auth file.
    pub fn from_json(raw: &str) -> Result<Self> {
        let file: AuthFile = serde_json::from_str(raw)
            .map_err(|e| LogAnalyticsError::config(format!("auth file is not valid JSON: {e}")))?;

        let tenant_id = required(file.tenant_id, "tenantId")?;
        let client_id = required(file.client_id, "clientId")?;
        let client_secret = required(file.client_secret, "clientSecret")?;

        tracing::debug!(
            tenant_id = %tenant_id,
            client_id = %client_id,
            has_active_directory_endpoint = file.active_directory_endpoint_url.is_some(),
            "Service principal auth file parsed"
        );

        Ok(Self {
            tenant_id,
            client_id,
            client_secret: SecretString::from(client_secret),
            active_directory_endpoint: file.active_directory_endpoint_url,
            resource_manager_endpoint: file.resource_manager_endpoint_url,
        })
    }

    /// Authority endpoint for the token exchange; required by the query path.
    pub fn authority(&self) -> Result<&str> {
        self.active_directory_endpoint.as_deref().ok_or_else(|| {
            LogAnalyticsError::config("auth file is missing activeDirectoryEndpointUrl")
        })
    }
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(LogAnalyticsError::config(format!(
            "auth file is missing {key}"
        ))),
    }
}

/// Decoded workspace shared key used by the ingestion path.
pub struct SharedKey(SecretBox<Vec<u8>>);

impl SharedKey {
    /// Decode a base64 shared key. Invalid or empty keys are configuration errors.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| LogAnalyticsError::config(format!("shared key is not valid base64: {e}")))?;
        if bytes.is_empty() {
            return Err(LogAnalyticsError::config("shared key is empty"));
        }
        Ok(Self(SecretBox::new(Box::new(bytes))))
    }

    pub(crate) fn expose(&self) -> &[u8] {
        self.0.expose_secret()
    }

    /// Decoded key length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expose().len()
    }

    /// Always false; empty keys are rejected at construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedKey([REDACTED; {} bytes])", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const AUTH_JSON: &str = r#"{
        "clientId": "11111111-2222-3333-4444-555555555555",
        "clientSecret": "s3cr3t",
        "subscriptionId": "ignored",
        "tenantId": "contoso-tenant",
        "activeDirectoryEndpointUrl": "https://login.microsoftonline.com",
        "resourceManagerEndpointUrl": "https://management.azure.com/"
    }"#;

    #[test]
    fn test_parse_sdk_auth_file() {
        let creds = Credentials::from_json(AUTH_JSON).unwrap();
        assert_eq!(creds.tenant_id, "contoso-tenant");
        assert_eq!(creds.client_id, "11111111-2222-3333-4444-555555555555");
        assert_eq!(creds.client_secret.expose_secret(), "s3cr3t");
        assert_eq!(creds.authority().unwrap(), "https://login.microsoftonline.com");
        assert_eq!(
            creds.resource_manager_endpoint.as_deref(),
            Some("https://management.azure.com/")
        );
    }

    #[test]
    fn test_debug_output_redacts_secret() {
        let creds = Credentials::from_json(AUTH_JSON).unwrap();
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("s3cr3t"));
    }

    #[test]
    fn test_missing_client_secret_is_config_error() {
        let err = Credentials::from_json(r#"{"tenantId":"t","clientId":"c"}"#).unwrap_err();
        assert!(matches!(err, LogAnalyticsError::Config(ref m) if m.contains("clientSecret")));
    }

    #[test]
    fn test_missing_authority_only_fails_when_requested() {
        let creds =
            Credentials::from_json(r#"{"tenantId":"t","clientId":"c","clientSecret":"s"}"#)
                .unwrap();
        assert!(matches!(creds.authority(), Err(LogAnalyticsError::Config(_))));
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = Credentials::from_json("not json").unwrap_err();
        assert!(matches!(err, LogAnalyticsError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(AUTH_JSON.as_bytes()).unwrap();

        let creds = Credentials::load(file.path()).unwrap();
        assert_eq!(creds.tenant_id, "contoso-tenant");
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Credentials::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, LogAnalyticsError::Config(_)));
    }

    #[test]
    fn test_shared_key_rejects_invalid_and_empty() {
        assert!(matches!(
            SharedKey::from_base64("%%%not-base64%%%"),
            Err(LogAnalyticsError::Config(_))
        ));
        assert!(matches!(
            SharedKey::from_base64(""),
            Err(LogAnalyticsError::Config(_))
        ));
    }

    #[test]
    fn test_shared_key_debug_is_redacted() {
        let key = SharedKey::from_base64("c2VjcmV0").unwrap();
        assert_eq!(key.len(), 6);
        assert_eq!(format!("{key:?}"), "SharedKey([REDACTED; 6 bytes])");
    }
}
