// External crates
use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, TextEncoder, register_histogram_vec,
    register_int_counter_vec,
};
use std::path::Path;
use std::time::Instant;
use tracing::instrument;

/// Outbound call being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Token,
    Ingest,
    Query,
}

impl Operation {
    /// Label value used in every metric.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Ingest => "ingest",
            Self::Query => "query",
        }
    }
}

lazy_static! {
    /// Wall time of each outbound HTTP exchange, including body download
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "log_analytics_http_request_duration_seconds",
        "Duration of outbound HTTP requests in seconds",
        &["operation"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    /// Responses by status class; `error` when no response arrived
    pub static ref HTTP_RESPONSES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "log_analytics_http_responses_total",
        "Outbound HTTP responses by operation and status class",
        &["operation", "status_class"]
    ).unwrap();
}

/// Label for a status code, `2xx` style.
#[must_use]
pub fn status_class(status: Option<u16>) -> &'static str {
    match status {
        Some(100..=199) => "1xx",
        Some(200..=299) => "2xx",
        Some(300..=399) => "3xx",
        Some(400..=499) => "4xx",
        Some(500..=599) => "5xx",
        _ => "error",
    }
}

/// Record one finished exchange.
pub fn observe_request(operation: Operation, start: Instant, status: Option<u16>) {
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[operation.as_str()])
        .observe(start.elapsed().as_secs_f64());
    HTTP_RESPONSES_TOTAL
        .with_label_values(&[operation.as_str(), status_class(status)])
        .inc();
}

/// Prometheus text exposition of every registered metric.
pub fn render() -> std::io::Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(std::io::Error::other)?;
    String::from_utf8(buffer).map_err(std::io::Error::other)
}

/// Write the exposition for a node-exporter textfile collector.
///
/// Written to a sibling temp file and renamed so the collector never reads a
/// partial file.
#[instrument(
    name = "metrics::write_textfile",
    target = "metrics::metrics",
    skip_all,
    level = "debug"
)]
pub fn write_textfile(path: &Path) -> std::io::Result<()> {
    let body = render()?;
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, body.as_bytes())?;
    std::fs::rename(&tmp, path)?;
    tracing::debug!(
        metrics_textfile = %path.display(),
        bytes = body.len(),
        "Wrote metrics textfile"
    );
    Ok(())
}
