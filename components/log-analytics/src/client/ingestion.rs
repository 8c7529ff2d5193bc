//! Ingestion client - responsibility and behavior
//!
//! Delivers a JSON array of records to the HTTP Data Collector API of one
//! workspace. Each POST carries a `SharedKey` signature computed over the method,
//! body length, content type, `x-ms-date` and resource path, so the date sent in
//! the header must be exactly the one that was signed.
//!
//! A 2xx status is the only success. Any other status comes back as a transport
//! error carrying the status and response body; nothing is retried.

// Local crates
use crate::auth::signer::{SignedRequest, Signer, rfc1123};
use crate::client::http::transport_error;
use crate::error::{LogAnalyticsError, Result};
use crate::helpers::load_config::IngestionConfig;
use crate::metrics::metrics::{Operation, observe_request};

// External crates
use chrono::{DateTime, Utc};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::time::Instant;
use tracing::instrument;

/// Resource path covered by the signature.
pub const LOGS_RESOURCE: &str = "/api/logs";
/// Content type of every ingestion body.
pub const JSON_CONTENT_TYPE: &str = "application/json";
const MAX_LOG_TYPE_LEN: usize = 100;

/// Outcome of an accepted POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionReceipt {
    /// HTTP status, 200 or 202 in practice.
    pub status: u16,
    /// Number of bytes sent.
    pub content_length: usize,
}

/// POSTs signed JSON bodies to the data collection endpoint.
#[derive(Debug, Clone)]
pub struct IngestionClient {
    client: Client,
    endpoint: String,
    api_version: String,
}

impl IngestionClient {
    /// Create a client. `config.endpoint` may contain `{workspace_id}`.
    pub fn new(client: Client, config: &IngestionConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_owned(),
            api_version: config.api_version.clone(),
        }
    }

    /// Full request URI for `workspace_id`.
    #[must_use]
    pub fn uri(&self, workspace_id: &str) -> String {
        format!(
            "{}{}?api-version={}",
            self.endpoint.replace("{workspace_id}", workspace_id),
            LOGS_RESOURCE,
            self.api_version
        )
    }

    /// Sign and send `json_body` as records of `log_type`, dated now.
    pub async fn ingest(
        &self,
        signer: &Signer,
        json_body: String,
        log_type: &str,
    ) -> Result<IngestionReceipt> {
        self.ingest_at(signer, json_body, log_type, Utc::now()).await
    }

    /// Sign and send `json_body` with an explicit `x-ms-date`.
    #[instrument(
        name = "ingestion_client::ingest",
        target = "client::ingestion",
        skip_all,
        fields(workspace_id = %signer.workspace_id(), log_type = %log_type),
        level = "debug"
    )]
    pub async fn ingest_at(
        &self,
        signer: &Signer,
        json_body: String,
        log_type: &str,
        date: DateTime<Utc>,
    ) -> Result<IngestionReceipt> {
        validate_log_type(log_type)?;

        let date = rfc1123(date);
        let content_length = json_body.len();
        let authorization = signer.sign(&SignedRequest {
            method: "POST".to_owned(),
            content_length,
            content_type: JSON_CONTENT_TYPE.to_owned(),
            date: date.clone(),
            resource: LOGS_RESOURCE.to_owned(),
        })?;

        let uri = self.uri(signer.workspace_id());
        tracing::debug!(
            ingestion_uri = %uri,
            content_length,
            x_ms_date = %date,
            "Posting signed records to data collection endpoint"
        );

        let start = Instant::now();
        let response = match self
            .client
            .post(&uri)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(AUTHORIZATION, authorization)
            .header("Log-Type", log_type)
            .header("x-ms-date", &date)
            .body(json_body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                observe_request(Operation::Ingest, start, None);
                tracing::error!(error = %e, "Ingestion request failed before a response arrived");
                return Err(transport_error(&e));
            }
        };

        let status = response.status();
        observe_request(Operation::Ingest, start, Some(status.as_u16()));

        if status.is_success() {
            tracing::info!(status = status.as_u16(), "Records accepted by data collection endpoint");
            return Ok(IngestionReceipt {
                status: status.as_u16(),
                content_length,
            });
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            status = status.as_u16(),
            response_body = %body,
            "Data collection endpoint rejected records"
        );
        Err(LogAnalyticsError::Transport {
            status: Some(status.as_u16()),
            message: if body.is_empty() {
                status.canonical_reason().unwrap_or("request rejected").to_owned()
            } else {
                body
            },
        })
    }
}

/// `Log-Type` must be letters, digits or underscore, at most 100 characters.
pub fn validate_log_type(log_type: &str) -> Result<()> {
    if log_type.is_empty() {
        return Err(LogAnalyticsError::input("log type is empty"));
    }
    if log_type.len() > MAX_LOG_TYPE_LEN {
        return Err(LogAnalyticsError::input(format!(
            "log type is longer than {MAX_LOG_TYPE_LEN} characters"
        )));
    }
    if !log_type
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(LogAnalyticsError::input(format!(
            "log type {log_type:?} may only contain letters, digits and underscore"
        )));
    }
    Ok(())
}
