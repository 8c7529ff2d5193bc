//! Tabular results: delimited parsing, JSON records and output renderers.

pub mod converter;
pub mod render;
pub mod result;
pub mod schema;
