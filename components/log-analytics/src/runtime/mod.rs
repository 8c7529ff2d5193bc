//! End to end pipelines behind each tool.

pub mod ingest;
pub mod query;
