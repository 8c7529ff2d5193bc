//! `la-query`: run KQL against a Log Analytics workspace and print the result.

use anyhow::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    log_analytics::cli::query::run().await
}
