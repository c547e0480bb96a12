//! Virtual path resolution with layered source precedence
//!
//! A virtual path is resolved against two layers: the user's loose source
//! tree first (pre-patched files win over the base game), then the game's
//! archive catalogs, reached through the [`ArchiveSource`] trait boundary.
//! Output paths are derived purely from the virtual path and the output
//! root, independent of where the bytes came from.

use crate::path::to_system_path;
use crate::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Concrete origin a file's bytes were read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    /// Loose file in the user source tree
    Loose(PathBuf),
    /// Entry in an archive catalog, labelled by the archive
    Archived(String),
    /// No source; the file was generated by a transform
    Generated,
}

/// Run configuration
///
/// Plain data shared by the resolver, the load cache and the write-back
/// engine.
#[derive(Debug, Clone)]
pub struct Settings {
    /// User source tree searched before the archives; `None` disables the
    /// loose layer entirely
    pub source_dir: Option<PathBuf>,
    /// Root of the output tree written by the write-back engine
    pub output_dir: PathBuf,
    /// Skip the loose layer even when `source_dir` is set
    pub ignore_loose_files: bool,
    /// Log the concrete source path of every load at info level instead
    /// of debug
    pub write_source_paths: bool,
    /// Run transforms but skip write-back entirely
    pub test_run: bool,
}

impl Settings {
    /// Settings with the given output root and all flags off.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: None,
            output_dir: output_dir.into(),
            ignore_loose_files: false,
            write_source_paths: false,
            test_run: false,
        }
    }

    /// Set the user source tree.
    pub fn with_source_dir(mut self, source_dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(source_dir.into());
        self
    }
}

/// Boundary to the archive catalog reader
///
/// The archive container format is outside this crate; anything that can
/// answer "do you have this virtual path, and what are its bytes" can back
/// the resolver.
pub trait ArchiveSource {
    /// Whether the archive holds an entry for the virtual path.
    fn contains(&self, virtual_path: &str) -> bool;

    /// Read the entry's bytes.
    fn read(&self, virtual_path: &str) -> Result<Vec<u8>>;

    /// Human-readable label for diagnostics and origin tracking.
    fn label(&self) -> String;
}

/// In-memory archive, for tests and for programmatic file injection
#[derive(Debug, Default)]
pub struct MemoryArchive {
    label: String,
    files: HashMap<String, Vec<u8>>,
}

impl MemoryArchive {
    /// Create an empty archive with a diagnostic label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            files: HashMap::new(),
        }
    }

    /// Add an entry.
    pub fn insert(&mut self, virtual_path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(virtual_path.into(), bytes.into());
    }
}

impl ArchiveSource for MemoryArchive {
    fn contains(&self, virtual_path: &str) -> bool {
        self.files.contains_key(virtual_path)
    }

    fn read(&self, virtual_path: &str) -> Result<Vec<u8>> {
        self.files
            .get(virtual_path)
            .cloned()
            .ok_or_else(|| Error::FileNotFound(virtual_path.to_string()))
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}

/// Maps virtual paths to concrete sources and output destinations
pub struct Resolver {
    settings: Settings,
    /// Archives in precedence order: later additions override earlier ones
    archives: Vec<Box<dyn ArchiveSource>>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("settings", &self.settings)
            .field("archives", &self.archives.len())
            .finish()
    }
}

impl Resolver {
    /// Create a resolver with no archives attached.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            archives: Vec::new(),
        }
    }

    /// Attach an archive. Later archives take precedence over earlier
    /// ones, and the loose source tree takes precedence over all of them.
    pub fn add_archive(&mut self, archive: Box<dyn ArchiveSource>) {
        self.archives.push(archive);
    }

    /// Run configuration.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether any layer can provide the virtual path.
    pub fn contains(&self, virtual_path: &str) -> bool {
        if let Some(path) = self.loose_path(virtual_path) {
            if path.is_file() {
                return true;
            }
        }
        self.archives
            .iter()
            .any(|archive| archive.contains(virtual_path))
    }

    /// Read the bytes for a virtual path from the highest-precedence layer
    /// that has it.
    pub fn resolve(&self, virtual_path: &str) -> Result<(Vec<u8>, SourceOrigin)> {
        if let Some(path) = self.loose_path(virtual_path) {
            if path.is_file() {
                let bytes = fs::read(&path)?;
                return Ok((bytes, SourceOrigin::Loose(path)));
            }
        }

        for archive in self.archives.iter().rev() {
            if archive.contains(virtual_path) {
                let bytes = archive.read(virtual_path)?;
                return Ok((bytes, SourceOrigin::Archived(archive.label())));
            }
        }

        Err(Error::FileNotFound(virtual_path.to_string()))
    }

    /// Destination path for a virtual path inside the output tree.
    ///
    /// Deterministic: depends only on the virtual path and the configured
    /// output root, never on the source layer.
    pub fn output_path(&self, virtual_path: &str) -> PathBuf {
        to_system_path(&self.settings.output_dir, virtual_path)
    }

    fn loose_path(&self, virtual_path: &str) -> Option<PathBuf> {
        if self.settings.ignore_loose_files {
            return None;
        }
        self.settings
            .source_dir
            .as_ref()
            .map(|dir| to_system_path(dir, virtual_path))
    }
}

/// Convenience for attaching a loose directory as an archive layer
///
/// Useful when a mod ships extracted files rather than catalogs; entries
/// are plain files under a root directory, addressed by virtual path.
#[derive(Debug)]
pub struct DirectoryArchive {
    root: PathBuf,
}

impl DirectoryArchive {
    /// Treat `root` as an archive of loose files.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArchiveSource for DirectoryArchive {
    fn contains(&self, virtual_path: &str) -> bool {
        to_system_path(&self.root, virtual_path).is_file()
    }

    fn read(&self, virtual_path: &str) -> Result<Vec<u8>> {
        let path = to_system_path(&self.root, virtual_path);
        if !path.is_file() {
            return Err(Error::FileNotFound(virtual_path.to_string()));
        }
        Ok(fs::read(path)?)
    }

    fn label(&self) -> String {
        self.root.display().to_string()
    }
}
