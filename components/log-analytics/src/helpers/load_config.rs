// Local crates
use crate::error::{LogAnalyticsError, Result};

// External crates
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Optional TOML configuration shared by both tools.
///
/// Every section and field has a default, so running without a config file is the
/// same as running with an empty one.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub http: HttpConfig,
    pub ingestion: IngestionConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load and parse the configuration file
    #[instrument(
        name = "config_loader",
        target = "helpers::load_config",
        level = "trace",
        skip_all
    )]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        tracing::trace!(
            configuration_file_path = %path_ref.display(),
            "Loading configuration file"
        );

        let config_str = match fs::read_to_string(path_ref) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read configuration file");
                return Err(LogAnalyticsError::config(format!(
                    "failed to read config file at {}: {e}",
                    path_ref.display()
                )));
            }
        };
        let config: Config = match toml::from_str(&config_str) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::error!(error = %e, "Failed to parse TOML configuration");
                return Err(LogAnalyticsError::config(format!(
                    "failed to parse TOML from {}: {e}",
                    path_ref.display()
                )));
            }
        };

        tracing::trace!(configuration_file_path = %path_ref.display(), "Configuration file loaded successfully");
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Deadline for a whole request, connect to last body byte.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct IngestionConfig {
    /// Custom log table name, sent as `Log-Type`.
    pub log_type: String,
    /// Endpoint base; `{workspace_id}` is substituted.
    pub endpoint: String,
    pub api_version: String,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            log_type: "StorageAccountAuditTest".to_owned(),
            endpoint: "https://{workspace_id}.ods.opinsights.azure.com".to_owned(),
            api_version: "2016-04-01".to_owned(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    pub endpoint: String,
    /// Token audience requested from the authority.
    pub resource: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.loganalytics.io".to_owned(),
            resource: "https://api.loganalytics.io".to_owned(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset and `--debug` is off.
    pub level: String,
    pub json: bool,
    /// Directory for a daily rolling log file.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            json: false,
            directory: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Prometheus textfile written when the tool exits.
    pub textfile: Option<PathBuf>,
}
