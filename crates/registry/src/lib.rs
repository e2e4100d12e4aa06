//! Key/value registry access for the configuration seed service
//!
//! - `RegistryClient`: the narrow capability set the seeding controller depends on
//! - `ConsulClient`: HTTP implementation against a Consul agent
//! - `MemoryRegistry`: in-process implementation used for dry runs and tests
//! - `wait_until_reachable`: bounded, fixed-delay reachability poll

pub mod consul;
pub mod memory;
pub mod reachability;

pub use consul::ConsulClient;
pub use memory::MemoryRegistry;
pub use reachability::{wait_until_reachable, ReachabilityPolicy};

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("registry returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("registry rejected write of key {0}")]
    Rejected(String),

    #[error("registry has no elected leader")]
    NoLeader,

    #[error("Cannot get connection to registry after {attempts} attempts")]
    Unreachable { attempts: u32 },

    #[error("invalid registry URL: {0}")]
    InvalidUrl(String),

    #[error("registry unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Operations the seeding controller needs from a key/value registry.
///
/// Keys are `/`-delimited; values are raw bytes.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Write `value` at `key`, overwriting any previous value.
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Recursively delete every key starting with `prefix`.
    async fn delete_tree(&self, prefix: &str) -> Result<()>;

    /// List every key starting with `prefix`.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Succeeds when the registry cluster has an elected leader.
    async fn leader_status(&self) -> Result<()>;
}
