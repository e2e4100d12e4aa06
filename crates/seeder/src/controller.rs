//! Seeding control flow: optional reset, existence probe, both pipelines

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use config_seed_config::{FileErrorPolicy, SeedSettings};
use config_seed_registry::RegistryClient;
use config_seed_types::{join_key, FlatEntry};
use tracing::{debug, error, info, warn};

use crate::document;
use crate::flatten::flatten;
use crate::walker::{is_profile_target, walk, DiscoveredFile, ExtensionSet};
use crate::{Result, SeedError};

/// Which family of documents a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    /// Flat `.properties` / `.yaml` documents
    Legacy,
    /// Hierarchical TOML documents, one per directory per profile
    Structured,
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pipeline::Legacy => f.write_str("legacy"),
            Pipeline::Structured => f.write_str("structured"),
        }
    }
}

/// A file (or walk root) that could not be seeded
#[derive(Debug)]
pub struct FileFailure {
    pub pipeline: Pipeline,
    pub path: PathBuf,
    pub error: SeedError,
}

/// Outcome of one or both pipelines
#[derive(Debug, Default)]
pub struct SeedReport {
    pub files_seeded: usize,
    pub entries_written: usize,
    pub failures: Vec<FileFailure>,
    /// A pipeline stopped early under `FileErrorPolicy::Abort`
    pub aborted: bool,
}

impl SeedReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: SeedReport) {
        self.files_seeded += other.files_seeded;
        self.entries_written += other.entries_written;
        self.failures.extend(other.failures);
        self.aborted |= other.aborted;
    }

    fn walk_failed(pipeline: Pipeline, root: &Path, source: std::io::Error) -> Self {
        Self {
            failures: vec![FileFailure {
                pipeline,
                path: root.to_path_buf(),
                error: SeedError::Walk {
                    root: root.to_path_buf(),
                    source,
                },
            }],
            ..Default::default()
        }
    }
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seeded {} files ({} keys), {} failed",
            self.files_seeded,
            self.entries_written,
            self.failures.len()
        )?;
        if self.aborted {
            f.write_str(", aborted early")?;
        }
        Ok(())
    }
}

/// Drives one seeding run against a registry.
///
/// Files are processed one at a time and entries are written one at a time;
/// a write failure abandons the rest of that file. Writes overwrite, so
/// re-running against unchanged files yields the same registry contents.
pub struct SeedController {
    registry: Arc<dyn RegistryClient>,
    settings: SeedSettings,
    profile: Option<String>,
}

impl SeedController {
    pub fn new(registry: Arc<dyn RegistryClient>, settings: SeedSettings) -> Self {
        Self {
            registry,
            settings,
            profile: None,
        }
    }

    /// Select `configuration-<profile>.<ext>` instead of `configuration.<ext>`
    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile.filter(|p| !p.is_empty());
        self
    }

    /// Reset (when configured), then seed the legacy and structured trees.
    ///
    /// Only a reset failure is returned as an error; per-file failures are
    /// collected in the report.
    pub async fn run(&self) -> Result<SeedReport> {
        if self.settings.is_reset {
            self.reset().await?;
        }

        self.is_initialized().await;

        let mut report = self.seed_legacy().await;
        report.merge(self.seed_structured().await);

        info!(
            files = report.files_seeded,
            keys = report.entries_written,
            failures = report.failures.len(),
            "seeding finished"
        );
        Ok(report)
    }

    /// Remove every key under the global prefix.
    pub async fn reset(&self) -> Result<()> {
        let prefix = &self.settings.global_prefix;
        self.registry
            .delete_tree(prefix)
            .await
            .map_err(|source| {
                error!(%prefix, error = %source, "failed to remove stored configuration");
                SeedError::Reset {
                    prefix: prefix.clone(),
                    source,
                }
            })?;
        info!("All values under the globalPrefix(\"{}\") are removed.", prefix);
        Ok(())
    }

    /// Whether any key already exists under the global prefix. Advisory
    /// only: a listing failure is logged and reported as `false`.
    pub async fn is_initialized(&self) -> bool {
        let prefix = &self.settings.global_prefix;
        match self.registry.list_keys(prefix).await {
            Ok(keys) if !keys.is_empty() => {
                info!("{} exists! The configuration data has been initialized.", prefix);
                true
            }
            Ok(_) => {
                info!("{} doesn't exist! Start importing configuration data.", prefix);
                false
            }
            Err(e) => {
                warn!(%prefix, error = %e, "could not list existing keys");
                false
            }
        }
    }

    /// Seed every accepted flat document under the legacy root.
    pub async fn seed_legacy(&self) -> SeedReport {
        let root = &self.settings.legacy_path;
        let extensions = ExtensionSet::new(&self.settings.acceptable_property_extensions);

        match walk(root, &extensions) {
            Ok(files) => self.seed_files(Pipeline::Legacy, files).await,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "legacy walk failed");
                SeedReport::walk_failed(Pipeline::Legacy, root, e)
            }
        }
    }

    /// Seed the profile-selected TOML document of every directory under the
    /// structured root.
    pub async fn seed_structured(&self) -> SeedReport {
        let root = &self.settings.structured_path;
        let extensions = ExtensionSet::new(&self.settings.toml_extensions);

        match walk(root, &extensions) {
            Ok(files) => {
                let profile = self.profile.as_deref();
                let selected = files
                    .into_iter()
                    .filter(|file| is_profile_target(file, profile))
                    .collect();
                self.seed_files(Pipeline::Structured, selected).await
            }
            Err(e) => {
                warn!(root = %root.display(), error = %e, "structured walk failed");
                SeedReport::walk_failed(Pipeline::Structured, root, e)
            }
        }
    }

    async fn seed_files(&self, pipeline: Pipeline, files: Vec<DiscoveredFile>) -> SeedReport {
        let policy = match pipeline {
            Pipeline::Legacy => self.settings.legacy_on_error,
            Pipeline::Structured => self.settings.structured_on_error,
        };
        let mut report = SeedReport::default();

        for file in files {
            info!(
                %pipeline,
                file = file.file_name(),
                context = %file.relative_dir,
                "found config file"
            );

            match self.seed_file(pipeline, &file, &mut report).await {
                Ok(()) => report.files_seeded += 1,
                Err(e) => {
                    warn!(%pipeline, path = %file.path.display(), error = %e, "skipping file");
                    report.failures.push(FileFailure {
                        pipeline,
                        path: file.path.clone(),
                        error: e,
                    });
                    if policy == FileErrorPolicy::Abort {
                        error!(%pipeline, "aborting walk after failed file");
                        report.aborted = true;
                        break;
                    }
                }
            }
        }

        report
    }

    async fn seed_file(
        &self,
        pipeline: Pipeline,
        file: &DiscoveredFile,
        report: &mut SeedReport,
    ) -> Result<()> {
        let entries = self.decode(pipeline, file)?;
        let prefix = join_key(&[self.settings.global_prefix.as_str(), file.relative_dir.as_str()]);

        for entry in entries {
            let key = entry.key_under(&prefix);
            self.registry
                .put(&key, entry.value.as_bytes())
                .await
                .map_err(|source| SeedError::Write {
                    key: key.clone(),
                    source,
                })?;
            debug!(%key, value = %entry.value, "wrote key");
            report.entries_written += 1;
        }

        Ok(())
    }

    fn decode(&self, pipeline: Pipeline, file: &DiscoveredFile) -> Result<Vec<FlatEntry>> {
        let decoded = match pipeline {
            Pipeline::Legacy => document::load_flat(&file.path, &self.settings),
            Pipeline::Structured => {
                document::load_structured(&file.path).map(|value| flatten("", &value))
            }
        };

        decoded.map_err(|source| SeedError::Decode {
            path: file.path.clone(),
            source,
        })
    }
}
