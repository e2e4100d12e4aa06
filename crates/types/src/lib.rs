//! Core types for the configuration seed service
//!
//! - `Value`: the decoded, format-agnostic form of a configuration document
//! - `FlatEntry`: one `(path, serialized scalar)` pair destined for one registry key

pub mod entry;
pub mod value;

pub use entry::*;
pub use value::*;

/// Separator between registry key segments.
pub const KEY_SEPARATOR: char = '/';
