//! Configuration utilities.

/// `usher.toml` schema and loading.
pub mod toml_config;

pub use toml_config::UsherConfig;
