//! Configuration loading.
//!
//! Layers, lowest precedence first: defaults, TOML file, process environment,
//! dotenv file, explicit overrides from the command line.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::env::EnvSource;
use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values that take precedence over every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub base_url: Option<String>,
}

/// Parse a TOML configuration document without validating it.
pub fn parse_config(content: &str) -> Result<RelayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Read a TOML file. Validation happens once every layer is applied.
pub fn read_config_file(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Resolve the effective configuration from every source, then validate it.
pub fn resolve_config(
    file: Option<&Path>,
    env: &EnvSource,
    overrides: &Overrides,
) -> Result<RelayConfig, ConfigError> {
    let mut config = match file {
        Some(path) => read_config_file(path)?,
        None => RelayConfig::default(),
    };

    env.apply(&mut config);

    if let Some(port) = overrides.port {
        config.listener.port = port;
    }
    if let Some(url) = &overrides.base_url {
        config.upstream.base_url = Some(url.clone());
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
