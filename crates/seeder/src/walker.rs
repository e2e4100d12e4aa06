//! Directory traversal and per-file namespace derivation

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use config_seed_config::normalize_extension;

/// Base name of the structured document selected for the default profile
pub const CONFIG_BASE_NAME: &str = "configuration";

/// A file accepted by the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Containing directory relative to the walk root, `/`-separated; empty
    /// for files directly under the root.
    pub relative_dir: String,
}

impl DiscoveredFile {
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    pub fn extension(&self) -> &str {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
    }
}

/// Set of accepted file extensions, compared without the leading dot.
#[derive(Debug, Clone, Default)]
pub struct ExtensionSet {
    extensions: Vec<String>,
}

impl ExtensionSet {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| normalize_extension(e.as_ref()))
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.extensions.iter().any(|e| e == ext),
            None => false,
        }
    }
}

/// Every file under `root` whose extension is accepted, depth-first with
/// the entries of each directory in lexical order. Other files are skipped.
pub fn walk(root: &Path, extensions: &ExtensionSet) -> io::Result<Vec<DiscoveredFile>> {
    let mut found = Vec::new();
    walk_dir(root, root, extensions, &mut found)?;
    Ok(found)
}

fn walk_dir(
    root: &Path,
    dir: &Path,
    extensions: &ExtensionSet,
    found: &mut Vec<DiscoveredFile>,
) -> io::Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        // Symlinked directories are not followed.
        if entry.file_type()?.is_dir() {
            walk_dir(root, &path, extensions, found)?;
        } else if path.is_file() && extensions.matches(&path) {
            found.push(DiscoveredFile {
                relative_dir: relative_dir(root, dir),
                path,
            });
        }
    }

    Ok(())
}

fn relative_dir(root: &Path, dir: &Path) -> String {
    dir.strip_prefix(root)
        .unwrap_or(dir)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// File name selected for `profile`: `configuration.<ext>` by default,
/// `configuration-<profile>.<ext>` otherwise.
pub fn profile_file_name(profile: Option<&str>, extension: &str) -> String {
    match profile.filter(|p| !p.is_empty()) {
        None => format!("{CONFIG_BASE_NAME}.{extension}"),
        Some(profile) => format!("{CONFIG_BASE_NAME}-{profile}.{extension}"),
    }
}

/// Whether `file` is the one document selected for `profile` in its directory.
pub fn is_profile_target(file: &DiscoveredFile, profile: Option<&str>) -> bool {
    file.file_name() == profile_file_name(profile, file.extension())
}
