//! Tracing subscriber and panic hook setup.

pub mod tracing;
