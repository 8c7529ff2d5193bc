//! Configuration loading.

pub mod load_config;
