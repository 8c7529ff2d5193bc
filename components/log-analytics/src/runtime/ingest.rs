// Local crates
use crate::{
    auth::{credentials::Credentials, credentials::SharedKey, signer::Signer},
    client::{
        http::build_client,
        ingestion::{IngestionClient, IngestionReceipt},
    },
    helpers::load_config::Config,
    tabular::{
        converter::{DEFAULT_DELIMITER, parse_delimited, to_json_records},
        schema::storage_log_columns,
    },
};

// External crates
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use tracing::instrument;

/// Inputs of one ingestion run.
#[derive(Debug)]
pub struct IngestRequest {
    /// Semicolon delimited storage analytics log.
    pub ingestion_file: PathBuf,
    /// Target workspace id.
    pub workspace_id: String,
    /// Service principal auth file; validated but not needed for signing.
    pub azure_auth: PathBuf,
    /// Workspace shared key, base64.
    pub key: SecretString,
    /// `Log-Type` override; the configured one is used otherwise.
    pub log_type: Option<String>,
}

/// Read, convert, sign and send one log file.
#[instrument(
    name = "ingest_pipeline::run",
    target = "runtime::ingest",
    skip_all,
    fields(workspace_id = %request.workspace_id),
    level = "debug"
)]
pub async fn run_ingestion(request: IngestRequest, config: &Config) -> Result<IngestionReceipt> {
    let credentials = Credentials::load(&request.azure_auth).context("Failed to load auth file")?;
    tracing::debug!(
        tenant_id = %credentials.tenant_id,
        client_id = %credentials.client_id,
        "Service principal auth file validated"
    );

    let key = SharedKey::from_base64(request.key.expose_secret())
        .context("Invalid workspace shared key")?;
    tracing::debug!(key_len = key.len(), "Workspace shared key decoded");
    let signer = Signer::new(request.workspace_id.clone(), key);

    let text = tokio::fs::read_to_string(&request.ingestion_file)
        .await
        .with_context(|| format!("Failed to read {}", request.ingestion_file.display()))?;

    let records = parse_delimited(&text, &storage_log_columns(), DEFAULT_DELIMITER)
        .with_context(|| format!("Failed to parse {}", request.ingestion_file.display()))?;
    let body = to_json_records(&records)?;
    tracing::info!(
        records = records.len(),
        body_bytes = body.len(),
        "Converted log file to JSON records"
    );

    let log_type = request
        .log_type
        .as_deref()
        .unwrap_or(&config.ingestion.log_type);

    let client = IngestionClient::new(build_client(&config.http)?, &config.ingestion);
    let receipt = client
        .ingest(&signer, body, log_type)
        .await
        .context("Ingestion request failed")?;

    Ok(receipt)
}
