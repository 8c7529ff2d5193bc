//! Output renderers for query results.
//!
//! Each renderer is a pure function from a result to text; [`OutputFormat`] picks one.

// Local crates
use crate::error::{LogAnalyticsError, Result};
use crate::tabular::converter::to_json_records;
use crate::tabular::result::{TabularResult, cell_text};

// External crates
use csv::WriterBuilder;
use serde_json::Value;

/// Output formats accepted by `--output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Aligned text table with a header row
    #[default]
    Table,
    /// JSON array of records
    Json,
    /// Comma separated values with a header row
    Csv,
    /// The response document exactly as the service returned it
    Standard,
}

/// Render `result` as `format`. `raw` is the response document `standard` passes through.
pub fn render(format: OutputFormat, result: &TabularResult, raw: &Value) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(to_table(result)),
        OutputFormat::Json => to_json_records(result),
        OutputFormat::Csv => to_csv(result),
        OutputFormat::Standard => to_json(raw),
    }
}

/// Header plus rows, each column right-aligned to its widest cell. Trailing
/// whitespace is trimmed from every line.
#[must_use]
pub fn to_table(result: &TabularResult) -> String {
    let cells: Vec<Vec<String>> = result
        .rows()
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    let widths: Vec<usize> = result
        .columns()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(cells.len() + 1);
    lines.push(format_line(result.columns().iter(), &widths));
    for row in &cells {
        lines.push(format_line(row.iter(), &widths));
    }
    lines.join("\n")
}

/// Header row of column names followed by one line per row.
pub fn to_csv(result: &TabularResult) -> Result<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    writer.write_record(result.columns()).map_err(csv_error)?;
    for row in result.rows() {
        writer
            .write_record(row.iter().map(cell_text))
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| LogAnalyticsError::input(format!("failed to flush CSV output: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| LogAnalyticsError::input(format!("CSV output is not UTF-8: {e}")))
}

/// The raw response document, unchanged.
pub fn to_json(raw: &Value) -> Result<String> {
    serde_json::to_string(raw)
        .map_err(|e| LogAnalyticsError::input(format!("failed to encode JSON output: {e}")))
}

fn format_line<'a>(values: impl Iterator<Item = &'a String>, widths: &[usize]) -> String {
    values
        .zip(widths)
        .map(|(value, &width)| format!("{value:>width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_owned()
}

fn csv_error(e: csv::Error) -> LogAnalyticsError {
    LogAnalyticsError::input(format!("failed to write CSV output: {e}"))
}
