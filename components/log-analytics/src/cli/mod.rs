//! Command line front ends for the two tools.

pub mod ingest;
pub mod query;

// Local crates
use crate::helpers::load_config::Config;
use crate::metrics::metrics::write_textfile;

// External crates
use std::path::PathBuf;

/// clap value parser for paths that must already exist.
fn existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("path {value:?} does not exist"))
    }
}

/// Flush metrics for this run, successful or not, then hand back its outcome.
///
/// The error itself is printed by `main`; it is only traced at debug here.
fn finish<T>(config: &Config, outcome: anyhow::Result<T>) -> anyhow::Result<T> {
    if let Err(e) = &outcome {
        tracing::debug!(error = %format!("{e:#}"), "Run failed");
    }
    if let Some(path) = &config.metrics.textfile {
        if let Err(e) = write_textfile(path) {
            tracing::warn!(error = %e, metrics_textfile = %path.display(), "Failed to write metrics textfile");
        }
    }
    outcome
}
