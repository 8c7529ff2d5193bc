// Local crates
use crate::{
    cli::{existing_file, finish},
    helpers::load_config::Config,
    instrumentation,
    runtime::ingest::{IngestRequest, run_ingestion},
};

// External crates
use anyhow::Result;
use clap::Parser;
use secrecy::SecretString;
use std::convert::Infallible;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "la-ingest",
    about = "Write records from a storage analytics log file to Log Analytics",
    long_about = "Reads a semicolon delimited storage analytics log, converts every line to a JSON record \
and posts the batch to the workspace's HTTP Data Collector API, signed with the workspace shared key.",
    version,
    term_width = 100,
    after_help = "\
    EXAMPLES:
        la-ingest -w $WORKSPACE_ID -k $KEY -a ~/.azureauth ./2024-01-01.log
        la-ingest --log_type StorageAudit --config ./log_analytics.toml ./2024-01-01.log"
)]
struct IngestCli {
    /// Storage analytics log file to ingest
    #[arg(value_parser = existing_file)]
    ingestion_file: PathBuf,

    /// Log Analytics workspace id
    #[arg(long = "workspace_id", short = 'w', env = "AZURE_ANALYTICS_WORKSPACE_ID")]
    workspace_id: String,

    /// Azure auth file in JSON (`az ad sp create-for-rbac --sdk-auth`)
    #[arg(long = "azure_auth", short = 'a', env = "AZURE_AUTH_LOCATION", value_parser = existing_file)]
    azure_auth: PathBuf,

    /// Log Analytics workspace shared key, base64
    #[arg(
        long = "key",
        short = 'k',
        env = "AZURE_ANALYTICS_KEY",
        hide_env_values = true,
        value_parser = secret_value
    )]
    key: SecretString,

    /// Custom log type the records are stored under
    #[arg(long = "log_type", short = 'l')]
    log_type: Option<String>,

    /// Optional TOML configuration file
    #[arg(long = "config", short = 'c', env = "LOG_ANALYTICS_CONFIG", value_parser = existing_file)]
    config: Option<PathBuf>,

    /// Turn on debug output on stderr
    #[arg(long = "debug", short = 'd')]
    debug: bool,
}

/// Keep the shared key wrapped from the moment it is parsed.
fn secret_value(value: &str) -> std::result::Result<SecretString, Infallible> {
    Ok(SecretString::from(value.to_owned()))
}

/// Entry function for `la-ingest`
pub async fn run() -> Result<()> {
    let cli = IngestCli::parse();

    let config = Config::load_or_default(cli.config.as_deref())?;
    instrumentation::tracing::init_panic_handler();
    let _guard = instrumentation::tracing::init_tracing(cli.debug, &config.logging)?;

    let request = IngestRequest {
        ingestion_file: cli.ingestion_file,
        workspace_id: cli.workspace_id,
        azure_auth: cli.azure_auth,
        key: cli.key,
        log_type: cli.log_type,
    };

    let outcome = run_ingestion(request, &config).await;
    let receipt = finish(&config, outcome)?;

    tracing::debug!(status = receipt.status, bytes = receipt.content_length, "Ingestion finished");
    println!("Accepted");
    Ok(())
}
