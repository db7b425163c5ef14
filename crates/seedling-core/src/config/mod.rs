//! Configuration file loading.
//!
//! Config files are YAML. Environment variables are interpolated into the raw
//! text before parsing, so secrets and per-environment values can stay out of
//! the file itself.

mod vars;

pub use vars::interpolate;

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::ConfigError;

/// Check if a path has a YAML extension.
pub fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "yaml" || ext == "yml")
        .unwrap_or(false)
}

/// Parse YAML text after environment variable interpolation.
pub fn parse_yaml<C: DeserializeOwned>(contents: &str) -> Result<C, ConfigError> {
    let text = interpolate(contents)?;
    serde_yaml::from_str(&text).map_err(|source| ConfigError::YamlParse { source })
}

/// Read and parse a YAML config file.
pub fn load_yaml_file<C: DeserializeOwned>(path: &Path) -> Result<C, ConfigError> {
    if !is_yaml_file(path) {
        return Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_yaml(&contents)
}
