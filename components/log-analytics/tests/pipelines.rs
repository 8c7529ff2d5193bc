mod common;

use common::{MockServer, Route};
use log_analytics::LogAnalyticsError;
use log_analytics::helpers::load_config::Config;
use log_analytics::runtime::ingest::{IngestRequest, run_ingestion};
use log_analytics::runtime::query::{QueryRequest, read_query_text, run_query};
use log_analytics::tabular::schema::STORAGE_LOG_COLUMNS;
use secrecy::SecretString;
use serde_json::Value;
use std::io::Write;
use tempfile::NamedTempFile;

fn auth_file(authority: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "clientId": "app-id",
            "clientSecret": "shh",
            "subscriptionId": "sub",
            "tenantId": "contoso",
            "activeDirectoryEndpointUrl": "{authority}",
            "resourceManagerEndpointUrl": "https://management.azure.com/"
        }}"#
    )
    .unwrap();
    file
}

fn log_line(request_id: &str) -> String {
    let mut fields: Vec<String> = (0..STORAGE_LOG_COLUMNS.len())
        .map(|i| format!("f{i}"))
        .collect();
    fields[0] = "1.0".to_owned();
    fields[13] = request_id.to_owned();
    fields[27] = "\"Azure-Storage/9.3.0 (.NET; Windows)\"".to_owned();
    fields.join(";")
}

#[tokio::test]
async fn test_ingestion_pipeline_posts_converted_records() {
    let server = MockServer::respond(200, "").await;
    let auth = auth_file("https://login.microsoftonline.com");

    let mut log = NamedTempFile::new().unwrap();
    writeln!(log, "{}", log_line("req-1")).unwrap();
    writeln!(log, "{}", log_line("req-2")).unwrap();

    let mut config = Config::default();
    config.ingestion.endpoint = server.url();

    let receipt = run_ingestion(
        IngestRequest {
            ingestion_file: log.path().to_path_buf(),
            workspace_id: "ws1".to_owned(),
            azure_auth: auth.path().to_path_buf(),
            key: SecretString::from("c2VjcmV0".to_owned()),
            log_type: None,
        },
        &config,
    )
    .await
    .unwrap();

    assert_eq!(receipt.status, 200);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.header("log-type"), Some("StorageAccountAuditTest"));
    assert_eq!(receipt.content_length, req.body.len());
    assert!(req.header("authorization").unwrap().starts_with("SharedKey ws1:"));

    let records: Value = serde_json::from_slice(&req.body).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["version-number"], "1.0");
    assert_eq!(records[0]["request-id-header"], "req-1");
    assert_eq!(records[1]["request-id-header"], "req-2");
    assert_eq!(
        records[0]["user-agent-header"],
        "Azure-Storage/9.3.0 (.NET; Windows)"
    );
    assert_eq!(
        records[0].as_object().unwrap().len(),
        STORAGE_LOG_COLUMNS.len()
    );
}

#[tokio::test]
async fn test_ingestion_pipeline_uses_log_type_override() {
    let server = MockServer::respond(202, "").await;
    let auth = auth_file("https://login.microsoftonline.com");
    let mut log = NamedTempFile::new().unwrap();
    writeln!(log, "{}", log_line("req-1")).unwrap();

    let mut config = Config::default();
    config.ingestion.endpoint = server.url();

    run_ingestion(
        IngestRequest {
            ingestion_file: log.path().to_path_buf(),
            workspace_id: "ws1".to_owned(),
            azure_auth: auth.path().to_path_buf(),
            key: SecretString::from("c2VjcmV0".to_owned()),
            log_type: Some("BlobAudit".to_owned()),
        },
        &config,
    )
    .await
    .unwrap();

    assert_eq!(server.requests()[0].header("log-type"), Some("BlobAudit"));
}

#[tokio::test]
async fn test_ingestion_pipeline_stops_on_malformed_line() {
    let server = MockServer::respond(200, "").await;
    let auth = auth_file("https://login.microsoftonline.com");
    let mut log = NamedTempFile::new().unwrap();
    writeln!(log, "{}", log_line("req-1")).unwrap();
    writeln!(log, "1.0;too;short").unwrap();

    let mut config = Config::default();
    config.ingestion.endpoint = server.url();

    let err = run_ingestion(
        IngestRequest {
            ingestion_file: log.path().to_path_buf(),
            workspace_id: "ws1".to_owned(),
            azure_auth: auth.path().to_path_buf(),
            key: SecretString::from("c2VjcmV0".to_owned()),
            log_type: None,
        },
        &config,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<LogAnalyticsError>(),
        Some(LogAnalyticsError::Input(_))
    ));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_ingestion_pipeline_rejects_bad_key() {
    let auth = auth_file("https://login.microsoftonline.com");
    let log = NamedTempFile::new().unwrap();

    let err = run_ingestion(
        IngestRequest {
            ingestion_file: log.path().to_path_buf(),
            workspace_id: "ws1".to_owned(),
            azure_auth: auth.path().to_path_buf(),
            key: SecretString::from("not base64!".to_owned()),
            log_type: None,
        },
        &Config::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<LogAnalyticsError>(),
        Some(LogAnalyticsError::Config(_))
    ));
}

#[tokio::test]
async fn test_query_pipeline_fetches_token_then_queries() {
    let server = MockServer::with_routes(vec![
        Route::at("/contoso/oauth2/token", 200, r#"{"access_token":"tok-xyz"}"#),
        Route::at(
            "/v1/workspaces/ws1/query",
            200,
            r#"{"tables":[{"name":"PrimaryResult","columns":[{"name":"Computer","type":"string"}],"rows":[["web-01"]]}]}"#,
        ),
    ])
    .await;
    let auth = auth_file(&server.url());

    let mut config = Config::default();
    config.query.endpoint = server.url();

    let response = run_query(
        &QueryRequest {
            kql: "Heartbeat | distinct Computer".to_owned(),
            timespan: "P1D".to_owned(),
            azure_auth: auth.path().to_path_buf(),
            workspace_id: "ws1".to_owned(),
        },
        &config,
    )
    .await
    .unwrap();

    assert_eq!(response.table.columns(), ["Computer"]);
    assert_eq!(response.table.rows()[0][0], "web-01");

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "/contoso/oauth2/token");
    assert_eq!(requests[1].path, "/v1/workspaces/ws1/query");
    assert_eq!(requests[1].header("authorization"), Some("Bearer tok-xyz"));
}

#[tokio::test]
async fn test_query_pipeline_does_not_query_without_token() {
    let server = MockServer::with_routes(vec![Route::at(
        "/contoso/oauth2/token",
        401,
        r#"{"error":"invalid_client"}"#,
    )])
    .await;
    let auth = auth_file(&server.url());

    let mut config = Config::default();
    config.query.endpoint = server.url();

    let err = run_query(
        &QueryRequest {
            kql: "Heartbeat".to_owned(),
            timespan: "P1D".to_owned(),
            azure_auth: auth.path().to_path_buf(),
            workspace_id: "ws1".to_owned(),
        },
        &config,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<LogAnalyticsError>(),
        Some(LogAnalyticsError::Authentication(_))
    ));
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_query_text_from_stdin() {
    let kql = read_query_text(None, &b"Heartbeat | take 5\n"[..])
        .await
        .unwrap();
    assert_eq!(kql, "Heartbeat | take 5\n");
}

#[tokio::test]
async fn test_query_text_from_file_ignores_stdin() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "AzureActivity | take 1").unwrap();

    let kql = read_query_text(Some(file.path()), &b"ignored"[..])
        .await
        .unwrap();
    assert_eq!(kql, "AzureActivity | take 1");
}

#[tokio::test]
async fn test_blank_query_text_is_input_error() {
    let err = read_query_text(None, &b"  \n\t"[..]).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<LogAnalyticsError>(),
        Some(LogAnalyticsError::Input(_))
    ));
}
