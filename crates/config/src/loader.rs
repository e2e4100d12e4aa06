//! Configuration loading from multiple sources

use crate::{ConfigError, Result, SeedConfig};
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the process configuration file inside the configuration directory
pub const CONFIG_FILE_NAME: &str = "configuration.toml";

/// Directory used when neither the flag nor the environment names one
pub const DEFAULT_CONFIG_DIR: &str = "./res";

/// Environment variable naming the configuration directory
pub const CONFIG_DIR_ENV: &str = "CONFIG_SEED_CONF_DIR";

/// Prefix of environment variables that override file settings
pub const ENV_PREFIX: &str = "CONFIG_SEED";

/// Configuration loader with support for multiple formats and sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file; the extension picks TOML, YAML or JSON.
    pub fn from_file(path: &Path) -> Result<SeedConfig> {
        let format = file_format(path).ok_or_else(|| {
            ConfigError::UnsupportedFormat(path.display().to_string())
        })?;

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = match format {
            FileFormat::Yaml => Self::from_yaml(&content)?,
            FileFormat::Json => Self::from_json(&content)?,
            _ => Self::from_toml(&content)?,
        };
        config.seed.normalize_extensions();
        Ok(config)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<SeedConfig> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from YAML string
    pub fn from_yaml(content: &str) -> Result<SeedConfig> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<SeedConfig> {
        serde_json::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Variables take the form `PREFIX_SECTION__KEY`, for example
    /// `CONFIG_SEED_SEED__IS_RESET=true` or `CONFIG_SEED_REGISTRY__HOST=consul`.
    pub fn from_file_with_env(path: &Path, env_prefix: &str) -> Result<SeedConfig> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        Self::builder().add_file(path, true).add_env(env_prefix).build()
    }

    /// Resolve the configuration directory: explicit flag, then
    /// `CONFIG_SEED_CONF_DIR`, then `./res`.
    pub fn resolve_dir(flag: Option<&Path>) -> PathBuf {
        if let Some(dir) = flag.filter(|d| !d.as_os_str().is_empty()) {
            return dir.to_path_buf();
        }

        match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => PathBuf::from(DEFAULT_CONFIG_DIR),
        }
    }

    /// Load `<dir>/configuration.toml` with `CONFIG_SEED_*` overrides
    pub fn load_from_dir(dir: &Path) -> Result<SeedConfig> {
        let path = dir.join(CONFIG_FILE_NAME);
        debug!(path = %path.display(), "loading process configuration");
        Self::from_file_with_env(&path, ENV_PREFIX)
    }

    /// Build configuration using the config crate's builder pattern
    ///
    /// This allows for more complex configuration scenarios with multiple sources
    pub fn builder() -> ConfigLoaderBuilder {
        ConfigLoaderBuilder {
            builder: Config::builder(),
        }
    }
}

/// Builder for layered configuration loading
pub struct ConfigLoaderBuilder {
    builder: ConfigBuilder<config::builder::DefaultState>,
}

impl ConfigLoaderBuilder {
    /// Add a configuration file source
    pub fn add_file(mut self, path: &Path, required: bool) -> Self {
        let format = file_format(path).unwrap_or(FileFormat::Toml);
        self.builder = self
            .builder
            .add_source(File::from(path).format(format).required(required));
        self
    }

    /// Add environment variable source with prefix
    pub fn add_env(mut self, prefix: &str) -> Self {
        self.builder = self.builder.add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
        self
    }

    /// Set a default value for a key
    pub fn set_default(mut self, key: &str, value: &str) -> Result<Self> {
        self.builder = self.builder.set_default(key, value)?;
        Ok(self)
    }

    /// Build the final configuration
    pub fn build(self) -> Result<SeedConfig> {
        let config = self.builder.build()?;
        let mut seed_config: SeedConfig = config.try_deserialize()?;
        seed_config.seed.normalize_extensions();
        Ok(seed_config)
    }
}

fn file_format(path: &Path) -> Option<FileFormat> {
    match path.extension().and_then(|e| e.to_str())? {
        "toml" => Some(FileFormat::Toml),
        "yaml" | "yml" => Some(FileFormat::Yaml),
        "json" => Some(FileFormat::Json),
        _ => None,
    }
}
