//! Configuration structures for the seed service

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main process configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Where the registry lives and how long to wait for it
    #[serde(default)]
    pub registry: RegistryConfig,

    /// What to seed and under which prefix
    #[serde(default)]
    pub seed: SeedSettings,
}

/// Registry (Consul agent) connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// `http` or `https`
    #[serde(default = "default_protocol")]
    pub protocol: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of failed reachability probes before giving up
    #[serde(default = "default_fail_limit")]
    pub fail_limit: u32,

    /// Seconds to sleep between reachability probes
    #[serde(default = "default_fail_wait_time_secs")]
    pub fail_wait_time_secs: u64,

    /// ACL token sent with every request
    #[serde(default)]
    pub token: Option<String>,
}

impl RegistryConfig {
    /// Base URL of the agent, e.g. `http://localhost:8500`
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    pub fn fail_wait_time(&self) -> Duration {
        Duration::from_secs(self.fail_wait_time_secs)
    }
}

/// What happens to the rest of a pipeline when one file fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileErrorPolicy {
    /// Log the failure, keep walking
    #[default]
    Skip,
    /// Stop the pipeline at the first failed file
    Abort,
}

/// Seeding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedSettings {
    /// Root namespace for every seeded key
    #[serde(default = "default_global_prefix")]
    pub global_prefix: String,

    /// Delete everything under `global_prefix` before seeding
    #[serde(default)]
    pub is_reset: bool,

    /// Root of the flat (`.properties` / `.yaml`) documents
    #[serde(default = "default_legacy_path")]
    pub legacy_path: PathBuf,

    /// Root of the hierarchical (`.toml`) documents
    #[serde(default = "default_structured_path")]
    pub structured_path: PathBuf,

    /// Extensions walked by the legacy pipeline
    #[serde(default = "default_property_extensions")]
    pub acceptable_property_extensions: Vec<String>,

    /// Legacy extensions decoded as YAML
    #[serde(default = "default_yaml_extensions")]
    pub yaml_extensions: Vec<String>,

    /// Extensions decoded as TOML; also the structured pipeline's extensions
    #[serde(default = "default_toml_extensions")]
    pub toml_extensions: Vec<String>,

    #[serde(default)]
    pub legacy_on_error: FileErrorPolicy,

    #[serde(default)]
    pub structured_on_error: FileErrorPolicy,
}

impl SeedSettings {
    /// Strips leading dots and surrounding whitespace from every extension
    /// list so that `.yaml` and `yaml` are the same entry.
    pub fn normalize_extensions(&mut self) {
        for list in [
            &mut self.acceptable_property_extensions,
            &mut self.yaml_extensions,
            &mut self.toml_extensions,
        ] {
            for ext in list.iter_mut() {
                *ext = normalize_extension(ext);
            }
            list.retain(|ext| !ext.is_empty());
        }
    }
}

/// `".toml"` -> `"toml"`
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_string()
}

// Default value functions
fn default_protocol() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8500
}

fn default_fail_limit() -> u32 {
    30
}

fn default_fail_wait_time_secs() -> u64 {
    3
}

fn default_global_prefix() -> String {
    "config".to_string()
}

fn default_legacy_path() -> PathBuf {
    PathBuf::from("./res/properties")
}

fn default_structured_path() -> PathBuf {
    PathBuf::from("./res/config")
}

fn default_property_extensions() -> Vec<String> {
    vec![
        "properties".to_string(),
        "yaml".to_string(),
        "yml".to_string(),
    ]
}

fn default_yaml_extensions() -> Vec<String> {
    vec!["yaml".to_string(), "yml".to_string()]
}

fn default_toml_extensions() -> Vec<String> {
    vec!["toml".to_string()]
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
            host: default_host(),
            port: default_port(),
            fail_limit: default_fail_limit(),
            fail_wait_time_secs: default_fail_wait_time_secs(),
            token: None,
        }
    }
}

impl Default for SeedSettings {
    fn default() -> Self {
        Self {
            global_prefix: default_global_prefix(),
            is_reset: false,
            legacy_path: default_legacy_path(),
            structured_path: default_structured_path(),
            acceptable_property_extensions: default_property_extensions(),
            yaml_extensions: default_yaml_extensions(),
            toml_extensions: default_toml_extensions(),
            legacy_on_error: FileErrorPolicy::Skip,
            structured_on_error: FileErrorPolicy::Skip,
        }
    }
}
