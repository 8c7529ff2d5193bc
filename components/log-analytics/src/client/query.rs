// Local crates
use crate::auth::token::BearerToken;
use crate::client::http::transport_error;
use crate::error::{LogAnalyticsError, Result};
use crate::helpers::load_config::QueryConfig;
use crate::metrics::metrics::{Operation, observe_request};
use crate::tabular::result::TabularResult;

// External crates
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::instrument;

/// Default `timespan` sent with a query.
pub const DEFAULT_TIMESPAN: &str = "P1DTH";

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    timespan: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryTable {
    columns: Vec<QueryColumn>,
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct QueryColumn {
    name: String,
}

/// A successful query: the first result table plus the document it came from.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    /// `tables[0]` as columns and rows.
    pub table: TabularResult,
    /// The full response document, for passthrough output.
    pub raw: Value,
}

/// Runs KQL against a workspace with a bearer token.
#[derive(Debug, Clone)]
pub struct QueryClient {
    client: Client,
    endpoint: String,
}

impl QueryClient {
    /// Create a client for the query API rooted at `config.endpoint`.
    pub fn new(client: Client, config: &QueryConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_owned(),
        }
    }

    /// Query URI for `workspace_id`.
    #[must_use]
    pub fn uri(&self, workspace_id: &str) -> String {
        format!("{}/v1/workspaces/{}/query", self.endpoint, workspace_id)
    }

    /// POST `{query, timespan}` and return the first result table.
    ///
    /// Any status other than 200 is a query error carrying the remote
    /// `error.message`.
    #[instrument(
        name = "query_client::query",
        target = "client::query",
        skip_all,
        fields(workspace_id = %workspace_id, timespan = %timespan),
        level = "debug"
    )]
    pub async fn query(
        &self,
        token: &BearerToken,
        workspace_id: &str,
        kql: &str,
        timespan: &str,
    ) -> Result<QueryResponse> {
        if kql.trim().is_empty() {
            return Err(LogAnalyticsError::input("query text is empty"));
        }

        let uri = self.uri(workspace_id);
        tracing::debug!(query_uri = %uri, query_len = kql.len(), "Sending query");

        let start = Instant::now();
        let response = match self
            .client
            .post(&uri)
            .bearer_auth(token.expose())
            .json(&QueryRequest {
                query: kql,
                timespan,
            })
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                observe_request(Operation::Query, start, None);
                tracing::error!(error = %e, "Query request failed before a response arrived");
                return Err(transport_error(&e));
            }
        };

        let status = response.status();
        let body = response.text().await;
        observe_request(Operation::Query, start, Some(status.as_u16()));
        let body = body.map_err(|e| LogAnalyticsError::Transport {
            status: Some(status.as_u16()),
            message: format!("failed to read query response: {e}"),
        })?;

        if status != StatusCode::OK {
            let message = remote_error_message(&body);
            tracing::error!(
                status = status.as_u16(),
                remote_message = %message,
                "Query endpoint reported a failure"
            );
            return Err(LogAnalyticsError::Query {
                status: status.as_u16(),
                message,
            });
        }

        let raw: Value = serde_json::from_str(&body)
            .map_err(|e| LogAnalyticsError::malformed(format!("query response is not JSON: {e}")))?;
        let table = first_table(&raw)?;

        tracing::debug!(
            columns = table.columns().len(),
            rows = table.len(),
            "Query returned result table"
        );
        Ok(QueryResponse { table, raw })
    }
}

/// `error.message` from an error body, falling back to the body itself.
fn remote_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.trim().to_owned())
}

/// Extract `tables[0]` from a query response document.
pub fn first_table(raw: &Value) -> Result<TabularResult> {
    let first = raw
        .get("tables")
        .and_then(Value::as_array)
        .and_then(|tables| tables.first())
        .ok_or_else(|| LogAnalyticsError::malformed("query response has no tables[0]"))?;

    let table: QueryTable = serde_json::from_value(first.clone())
        .map_err(|e| LogAnalyticsError::malformed(format!("tables[0] is malformed: {e}")))?;

    let columns = table.columns.into_iter().map(|c| c.name).collect();
    TabularResult::new(columns, table.rows).map_err(|e| match e {
        LogAnalyticsError::Input(msg) => LogAnalyticsError::malformed(format!("tables[0]: {msg}")),
        other => other,
    })
}
