//! Prometheus metrics for outbound requests.

pub mod metrics;
