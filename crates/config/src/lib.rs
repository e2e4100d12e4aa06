//! Process configuration for the configuration seed service
//!
//! `SeedConfig` names the registry to seed and the directory trees to seed it
//! from. It is read from `<confdir>/configuration.toml` (YAML and JSON are
//! accepted too) with `CONFIG_SEED_*` environment overrides layered on top,
//! then validated as a whole.

mod config;
mod loader;
mod validation;

pub use config::*;
pub use loader::*;
pub use validation::*;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not load configuration file ({}): not found", .0.display())]
    NotFound(PathBuf),

    #[error("could not load configuration file ({}): {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Source(#[from] ::config::ConfigError),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
