//! HTTP clients for the ingestion and query endpoints.

pub mod http;
pub mod ingestion;
pub mod query;
