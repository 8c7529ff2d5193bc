// Local crates
use crate::{
    cli::{existing_file, finish},
    client::query::{DEFAULT_TIMESPAN, QueryResponse},
    helpers::load_config::Config,
    instrumentation,
    runtime::query::{QueryRequest, read_query_text, run_query},
    tabular::render::{OutputFormat, render},
};

// External crates
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio::io::AsyncRead;

const BANNER: &str = "====================================================================";

#[derive(Parser, Debug)]
#[command(
    name = "la-query",
    about = "Query Log Analytics over REST and print the result",
    long_about = "Runs a KQL query against a Log Analytics workspace using a service principal token. \
The query is read from QUERY_FILE, or from standard input when no file is given.",
    version,
    term_width = 100,
    after_help = "\
    EXAMPLES:
        la-query -w $WORKSPACE_ID -a ~/.azureauth ./errors.kql
        echo 'Heartbeat | take 5' | la-query -o csv"
)]
struct QueryCli {
    /// File holding the KQL query; standard input when omitted
    #[arg(value_parser = existing_file)]
    query_file: Option<PathBuf>,

    /// Time period the query should span
    #[arg(long = "timespan", short = 't', default_value = DEFAULT_TIMESPAN)]
    timespan: String,

    /// Azure auth file in JSON (`az ad sp create-for-rbac --sdk-auth`)
    #[arg(long = "azure_auth", short = 'a', env = "AZURE_AUTH_LOCATION", value_parser = existing_file)]
    azure_auth: PathBuf,

    /// Type of output to produce
    #[arg(long = "output", short = 'o', value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    /// Log Analytics workspace id to query
    #[arg(long = "workspace_id", short = 'w', env = "LOG_ANALYTICS_WORKSPACE_ID")]
    workspace_id: String,

    /// Optional TOML configuration file
    #[arg(long = "config", short = 'c', env = "LOG_ANALYTICS_CONFIG", value_parser = existing_file)]
    config: Option<PathBuf>,

    /// Turn on debug output on stderr
    #[arg(long = "debug", short = 'd')]
    debug: bool,
}

/// Entry function for `la-query`
pub async fn run() -> Result<()> {
    let cli = QueryCli::parse();

    let config = Config::load_or_default(cli.config.as_deref())?;
    instrumentation::tracing::init_panic_handler();
    let _guard = instrumentation::tracing::init_tracing(cli.debug, &config.logging)?;

    let outcome = execute(&cli, &config, tokio::io::stdin()).await;
    let (kql, response) = finish(&config, outcome)?;

    let rendered = render(cli.output, &response.table, &response.raw)?;
    if cli.output == OutputFormat::Table {
        println!("{}", kql_banner(&kql));
    }
    println!("{rendered}");
    Ok(())
}

/// Read the KQL and run it, handing back the text alongside the response.
async fn execute<R>(cli: &QueryCli, config: &Config, stdin: R) -> Result<(String, QueryResponse)>
where
    R: AsyncRead + Unpin,
{
    let kql = read_query_text(cli.query_file.as_deref(), stdin).await?;

    let request = QueryRequest {
        kql,
        timespan: cli.timespan.clone(),
        azure_auth: cli.azure_auth.clone(),
        workspace_id: cli.workspace_id.clone(),
    };

    let response = run_query(&request, config).await?;
    Ok((request.kql, response))
}

/// The query echoed between rules, printed above table output.
fn kql_banner(kql: &str) -> String {
    format!("{BANNER}\nKQL:\n{}\n{BANNER}", kql.trim_end())
}
