/// Column layout of a storage analytics log line (log format 1.0), in file order.
pub const STORAGE_LOG_COLUMNS: &[&str] = &[
    "version-number",
    "request-start-time",
    "operation-type",
    "request-status",
    "http-status-code",
    "end-to-end-latency-in-ms",
    "server-latency-in-ms",
    "authentication-type",
    "requester-account-name",
    "owner-account-name",
    "service-type",
    "request-url",
    "requested-object-key",
    "request-id-header",
    "operation-count",
    "requester-ip-address",
    "request-version-header",
    "request-header-size",
    "request-packet-size",
    "response-header-size",
    "response-packet-size",
    "request-content-length",
    "request-md5",
    "server-md5",
    "etag-identifier",
    "last-modified-time",
    "conditions-used",
    "user-agent-header",
    "referrer-header",
    "client-request-id",
];

/// Owned copy of [`STORAGE_LOG_COLUMNS`] for building a result.
#[must_use]
pub fn storage_log_columns() -> Vec<String> {
    STORAGE_LOG_COLUMNS.iter().map(|&c| c.to_owned()).collect()
}
