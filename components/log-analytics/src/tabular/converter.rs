//! Delimited text to [`TabularResult`] and back out as JSON records.

// Local crates
use crate::error::{LogAnalyticsError, Result};
use crate::tabular::result::TabularResult;

// External crates
use csv::ReaderBuilder;
use serde_json::{Map, Value};
use tracing::instrument;

/// Field separator of storage analytics log lines.
pub const DEFAULT_DELIMITER: u8 = b';';

/// Parse delimited `text` into rows over `columns`.
///
/// Blank lines are skipped and double-quoted fields may contain the delimiter.
/// Values are kept as opaque strings. A line with a different number of fields
/// rejects the whole input.
#[instrument(
    name = "tabular_converter::parse_delimited",
    target = "tabular::converter",
    skip_all,
    level = "debug"
)]
pub fn parse_delimited(text: &str, columns: &[String], delimiter: u8) -> Result<TabularResult> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut result = TabularResult::with_columns(columns.to_vec());

    for record in reader.records() {
        let record = record.map_err(|e| {
            LogAnalyticsError::input(format!("failed to read delimited input: {e}"))
        })?;
        let line = record.position().map_or(0, csv::Position::line);

        if record.len() != columns.len() {
            tracing::error!(
                line,
                fields = record.len(),
                expected = columns.len(),
                "Delimited line does not match the column schema"
            );
            return Err(LogAnalyticsError::input(format!(
                "line {line} has {} fields, expected {}",
                record.len(),
                columns.len()
            )));
        }

        result.push_row(
            record
                .iter()
                .map(|field| Value::String(field.to_owned()))
                .collect(),
        )?;
    }

    tracing::debug!(
        rows = result.len(),
        columns = columns.len(),
        "Parsed delimited input"
    );
    Ok(result)
}

/// JSON array with one object per row, keys in column order.
pub fn to_json_records(result: &TabularResult) -> Result<String> {
    let records: Vec<Value> = result
        .rows()
        .iter()
        .map(|row| {
            let record: Map<String, Value> = result
                .columns()
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect();
            Value::Object(record)
        })
        .collect();

    serde_json::to_string(&records)
        .map_err(|e| LogAnalyticsError::input(format!("failed to encode JSON records: {e}")))
}
