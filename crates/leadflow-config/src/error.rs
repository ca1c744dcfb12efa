//! Errors raised while reading `leadflow.toml`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No LeadFlow config at {}", .0.display())]
    NotFound(PathBuf),

    /// A `${NAME}` reference without a `:-` fallback whose variable is unset.
    #[error("Config references ${{{0}}} but it is not set")]
    EnvVarNotSet(String),

    #[error("Could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config: {0}")]
    TomlParse(#[from] toml::de::Error),
}
