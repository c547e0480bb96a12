//! Load cache and transform dependency declaration
//!
//! The [`FileManager`] owns every file loaded during a run. A virtual path
//! is resolved, read and parsed at most once; every transform that touches
//! it sees the same live instance, so in-memory edits accumulate in call
//! order. Entries are never evicted or replaced, and iteration for
//! write-back follows insertion order.
//!
//! Transforms declare their required virtual paths up front in a
//! [`Transform`] record. If any requirement cannot be resolved, the
//! transform is skipped with a diagnostic and the run continues; a
//! transform body never runs with partial dependencies.

use crate::file::GameFile;
use crate::resolver::{ArchiveSource, Resolver, Settings};
use crate::table::TableFile;
use crate::xml::XmlFile;
use crate::{BinaryFile, Error, GeneratedFile, Result};
use std::collections::HashMap;

/// Body of a transform: mutates files through the manager
pub type TransformFn = fn(&mut FileManager) -> Result<()>;

/// A registered transform with its declared file dependencies
///
/// The dependency list is data, not behavior: it is inspected before the
/// body runs, so a user script can be validated without executing it.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    /// Identifier used in diagnostics
    pub name: &'static str,
    /// Virtual paths that must be loadable before the body runs
    pub requires: &'static [&'static str],
    /// The transform body
    pub apply: TransformFn,
}

/// Keyed store of every file loaded or generated during one run
pub struct FileManager {
    resolver: Resolver,
    cache: HashMap<String, GameFile>,
    /// Cache keys in insertion order; the cache grows monotonically
    order: Vec<String>,
}

impl std::fmt::Debug for FileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileManager")
            .field("resolver", &self.resolver)
            .field("cached", &self.order)
            .finish()
    }
}

impl FileManager {
    /// Create a manager over an empty cache.
    pub fn new(settings: Settings) -> Self {
        Self {
            resolver: Resolver::new(settings),
            cache: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Attach an archive layer to the resolver.
    pub fn add_archive(&mut self, archive: Box<dyn ArchiveSource>) {
        self.resolver.add_archive(archive);
    }

    /// Run configuration.
    pub fn settings(&self) -> &Settings {
        self.resolver.settings()
    }

    /// The path resolver.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Get the typed file for a virtual path, loading and parsing it on
    /// first reference.
    ///
    /// Repeated calls return the same live instance; no I/O happens after
    /// the first load.
    pub fn load_file(&mut self, virtual_path: &str) -> Result<&mut GameFile> {
        if !self.cache.contains_key(virtual_path) {
            let (bytes, origin) = self.resolver.resolve(virtual_path)?;
            if self.settings().write_source_paths {
                log::info!("{virtual_path} sourced from {origin:?}");
            } else {
                log::debug!("{virtual_path} sourced from {origin:?}");
            }
            let file = GameFile::load(virtual_path, &bytes, origin)?;
            self.order.push(virtual_path.to_string());
            self.cache.insert(virtual_path.to_string(), file);
        }
        self.cache
            .get_mut(virtual_path)
            .ok_or_else(|| Error::FileNotFound(virtual_path.to_string()))
    }

    /// Load a virtual path and view it as a table.
    pub fn load_table(&mut self, virtual_path: &str) -> Result<&mut TableFile> {
        self.load_file(virtual_path)?
            .as_table_mut()
            .ok_or_else(|| Error::integrity(format!("{virtual_path} is not a table file")))
    }

    /// Load a virtual path and view it as an XML document.
    pub fn load_xml(&mut self, virtual_path: &str) -> Result<&mut XmlFile> {
        self.load_file(virtual_path)?
            .as_xml_mut()
            .ok_or_else(|| Error::integrity(format!("{virtual_path} is not an XML file")))
    }

    /// Load a virtual path and view it as a binary buffer.
    pub fn load_binary(&mut self, virtual_path: &str) -> Result<&mut BinaryFile> {
        self.load_file(virtual_path)?
            .as_binary_mut()
            .ok_or_else(|| Error::integrity(format!("{virtual_path} is not a binary file")))
    }

    /// Register a transform-generated file for write-back.
    ///
    /// The path must not collide with a loaded file; each virtual path has
    /// one instance per run.
    pub fn add_generated(&mut self, virtual_path: &str, file: GeneratedFile) -> Result<()> {
        if self.cache.contains_key(virtual_path) {
            return Err(Error::integrity(format!(
                "{virtual_path} already exists in the load cache"
            )));
        }
        self.order.push(virtual_path.to_string());
        self.cache
            .insert(virtual_path.to_string(), GameFile::generated(virtual_path, file));
        Ok(())
    }

    /// Whether a virtual path is already cached.
    pub fn is_loaded(&self, virtual_path: &str) -> bool {
        self.cache.contains_key(virtual_path)
    }

    /// Number of cached files.
    pub fn loaded_count(&self) -> usize {
        self.order.len()
    }

    /// Iterate over cached files in insertion order.
    pub fn files(&self) -> impl Iterator<Item = &GameFile> {
        self.order.iter().filter_map(|key| self.cache.get(key))
    }

    /// Run one transform: check its declared dependencies, load them, then
    /// execute the body.
    ///
    /// A missing dependency skips the transform with a warning and is not
    /// an error; anything else (schema misses, parse failures, body
    /// failures) propagates.
    pub fn run(&mut self, transform: &Transform) -> Result<()> {
        for required in transform.requires {
            if !self.is_loaded(required) && !self.resolver.contains(required) {
                log::warn!(
                    "skipping {}: required file {required} not found",
                    transform.name
                );
                return Ok(());
            }
        }

        for required in transform.requires {
            match self.load_file(required) {
                Ok(_) => {}
                Err(err) if err.is_recoverable() => {
                    log::warn!("skipping {}: {err}", transform.name);
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }

        log::debug!("running {}", transform.name);
        (transform.apply)(self)
    }

    /// Run a sequence of transforms in declaration order.
    pub fn run_all(&mut self, transforms: &[Transform]) -> Result<()> {
        for transform in transforms {
            self.run(transform)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::MemoryArchive;

    const GLOBALS: &str = "// globals\n2;\nSG_MAX_X;100000;\nSG_MAX_Y;100000;\n";

    fn manager() -> FileManager {
        let mut archive = MemoryArchive::new("01.cat");
        archive.insert("types/Globals.txt", GLOBALS.as_bytes());
        archive.insert(
            "maps/x3_universe.xml",
            b"<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n<universe />\n".to_vec(),
        );
        let dir = std::env::temp_dir();
        let mut manager = FileManager::new(Settings::new(dir));
        manager.add_archive(Box::new(archive));
        manager
    }

    #[test]
    fn test_load_once_shared_instance() {
        let mut manager = manager();

        {
            let table = manager.load_table("types/Globals.txt").unwrap();
            let mut rows = table.data_rows_mut();
            rows.next().unwrap().set("value", "42");
        }
        assert_eq!(manager.loaded_count(), 1);

        // A second load sees the first load's uncommitted edit.
        let table = manager.load_table("types/Globals.txt").unwrap();
        assert_eq!(table.data_rows().next().unwrap().get("value"), Some("42"));
        assert_eq!(manager.loaded_count(), 1);
    }

    #[test]
    fn test_missing_file_skips_transform() {
        static TOUCHED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);
        fn body(_manager: &mut FileManager) -> Result<()> {
            TOUCHED.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
        let transform = Transform {
            name: "needs_missing_file",
            requires: &["types/Globals.txt", "types/TMissing.txt"],
            apply: body,
        };

        let mut manager = manager();
        manager.run(&transform).unwrap();
        assert!(!TOUCHED.load(std::sync::atomic::Ordering::SeqCst));
        // Partial dependency satisfaction never loads anything either.
        assert_eq!(manager.loaded_count(), 0);
    }

    #[test]
    fn test_run_loads_dependencies() {
        fn body(manager: &mut FileManager) -> Result<()> {
            assert!(manager.is_loaded("types/Globals.txt"));
            let table = manager.load_table("types/Globals.txt")?;
            for row in table.data_rows_mut() {
                row.set("value", "0");
            }
            Ok(())
        }
        let transform = Transform {
            name: "zero_globals",
            requires: &["types/Globals.txt"],
            apply: body,
        };

        let mut manager = manager();
        manager.run(&transform).unwrap();
        let table = manager.load_table("types/Globals.txt").unwrap();
        assert!(table.is_dirty());
    }

    #[test]
    fn test_body_error_propagates() {
        fn body(_manager: &mut FileManager) -> Result<()> {
            Err(Error::integrity("boom"))
        }
        let transform = Transform {
            name: "exploder",
            requires: &[],
            apply: body,
        };
        let mut manager = manager();
        assert!(manager.run(&transform).is_err());
    }

    #[test]
    fn test_wrong_kind_access() {
        let mut manager = manager();
        assert!(manager.load_xml("types/Globals.txt").is_err());
        assert!(manager.load_table("maps/x3_universe.xml").is_err());
    }

    #[test]
    fn test_generated_collision_rejected() {
        let mut manager = manager();
        manager
            .add_generated("readme.txt", GeneratedFile::text("a"))
            .unwrap();
        assert!(
            manager
                .add_generated("readme.txt", GeneratedFile::text("b"))
                .is_err()
        );
    }

    #[test]
    fn test_files_iterate_in_insertion_order() {
        let mut manager = manager();
        manager.load_file("maps/x3_universe.xml").unwrap();
        manager.load_file("types/Globals.txt").unwrap();
        let order: Vec<&str> = manager.files().map(|f| f.virtual_path()).collect();
        assert_eq!(order, vec!["maps/x3_universe.xml", "types/Globals.txt"]);
    }
}
