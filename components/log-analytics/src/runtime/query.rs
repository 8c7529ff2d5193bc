// Local crates
use crate::{
    auth::{credentials::Credentials, token::TokenProvider},
    client::{
        http::build_client,
        query::{QueryClient, QueryResponse},
    },
    error::LogAnalyticsError,
    helpers::load_config::Config,
};

// External crates
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::instrument;

/// Inputs of one query run.
#[derive(Debug)]
pub struct QueryRequest {
    /// KQL text.
    pub kql: String,
    /// ISO 8601 duration the query spans.
    pub timespan: String,
    /// Service principal auth file.
    pub azure_auth: PathBuf,
    /// Workspace to query.
    pub workspace_id: String,
}

/// Read KQL from `query_file`, or from `stdin` when no file is given.
///
/// Blank text is an input error.
pub async fn read_query_text<R>(query_file: Option<&Path>, stdin: R) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let kql = match query_file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read query file {}", path.display()))?,
        None => {
            let mut text = String::new();
            let mut stdin = stdin;
            stdin
                .read_to_string(&mut text)
                .await
                .context("Failed to read query from standard input")?;
            text
        }
    };

    if kql.trim().is_empty() {
        return Err(LogAnalyticsError::input("no KQL text was provided").into());
    }
    Ok(kql)
}

/// Fetch a token, run the query and return the first result table.
///
/// The token exchange completes before the query is sent.
#[instrument(
    name = "query_pipeline::run",
    target = "runtime::query",
    skip_all,
    fields(workspace_id = %request.workspace_id),
    level = "debug"
)]
pub async fn run_query(request: &QueryRequest, config: &Config) -> Result<QueryResponse> {
    let credentials = Credentials::load(&request.azure_auth).context("Failed to load auth file")?;

    let client = build_client(&config.http)?;

    let token = TokenProvider::new(client.clone())
        .token_for(&credentials, &config.query.resource)
        .await
        .context("Failed to obtain bearer token")?;

    let response = QueryClient::new(client, &config.query)
        .query(&token, &request.workspace_id, &request.kql, &request.timespan)
        .await
        .context("Query request failed")?;

    tracing::info!(
        rows = response.table.len(),
        columns = response.table.columns().len(),
        "Query completed"
    );
    Ok(response)
}
