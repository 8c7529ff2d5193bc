//! Move tabular telemetry into and out of a Log Analytics workspace.
//!
//! Two pipelines share one primitive, "authenticate, send, interpret":
//!
//! ```text
//! ingest: file -> parse_delimited -> JSON records -> Signer -> IngestionClient -> POST /api/logs
//! query:  KQL  -> TokenProvider -> BearerToken -> QueryClient -> TabularResult -> render
//! ```

#![allow(clippy::module_inception)]

pub mod auth;
pub mod cli;
pub mod client;
pub mod error;
pub mod helpers;
pub mod instrumentation;
pub mod metrics;
pub mod runtime;
pub mod tabular;

pub use error::{LogAnalyticsError, Result};
