//! `la-ingest`: post a storage analytics log file to a Log Analytics workspace.

use anyhow::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parsing, logging setup and the ingestion pipeline all live in the library.
    log_analytics::cli::ingest::run().await
}
