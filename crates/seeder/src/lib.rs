//! Seeds a key/value registry from on-disk configuration documents
//!
//! Two pipelines share one write path:
//! - legacy: flat `.properties` / `.yaml` documents, written key by key
//! - structured: hierarchical TOML documents, flattened to `/`-joined paths
//!
//! Every entry lands at `<global prefix>/<directory relative to the root>/<path>`.

pub mod controller;
pub mod document;
pub mod error;
pub mod flatten;
pub mod properties;
pub mod walker;

pub use controller::{FileFailure, Pipeline, SeedController, SeedReport};
pub use document::{DocumentError, DocumentFormat};
pub use error::{Result, SeedError};
pub use flatten::flatten;
pub use walker::{walk, DiscoveredFile, ExtensionSet};
