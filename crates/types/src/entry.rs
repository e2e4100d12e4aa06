use crate::KEY_SEPARATOR;
use std::fmt;

/// A single `(path, serialized scalar)` pair destined for one registry key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlatEntry {
    pub path: String,
    pub value: String,
}

impl FlatEntry {
    pub fn new(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Full registry key for this entry under `prefix`: `<prefix>/<path>`.
    ///
    /// The path is appended verbatim, so document keys that are empty or end
    /// in `/` keep their own key.
    pub fn key_under(&self, prefix: &str) -> String {
        let prefix = prefix.trim_end_matches(KEY_SEPARATOR);
        if prefix.is_empty() {
            return self.path.clone();
        }
        format!("{prefix}{KEY_SEPARATOR}{}", self.path)
    }
}

impl fmt::Display for FlatEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.path, self.value)
    }
}

/// Joins namespace segments (global prefix, relative directory) with `/`,
/// skipping empty segments and collapsing separators at the joins. Entry
/// paths go through [`FlatEntry::key_under`] instead.
pub fn join_key(segments: &[&str]) -> String {
    let mut key = String::new();
    for segment in segments {
        let segment = segment.trim_matches(KEY_SEPARATOR);
        if segment.is_empty() {
            continue;
        }
        if !key.is_empty() {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(segment);
    }
    key
}
