//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{ServiceConfig, ServiceConfigBuilder};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Parse a TOML document into a configuration, filling defaults.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    let builder: ServiceConfigBuilder = toml::from_str(content)?;
    Ok(builder.build())
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}
