use std::path::PathBuf;

use config_seed_registry::RegistryError;
use thiserror::Error;

use crate::document::DocumentError;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to walk {}: {source}", .root.display())]
    Walk {
        root: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: DocumentError,
    },

    #[error("failed to write key {key}: {source}")]
    Write { key: String, source: RegistryError },

    #[error("failed to remove values under {prefix}: {source}")]
    Reset {
        prefix: String,
        source: RegistryError,
    },
}

pub type Result<T> = std::result::Result<T, SeedError>;
