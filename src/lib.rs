//! # x3_patcher - Game Data Patching Pipeline
//!
//! A typed file abstraction and dependency-tracked load/mutate/write
//! pipeline for X3: Albion Prelude game data. User scripts assemble a
//! sequence of transforms; each transform declares the virtual paths it
//! needs, receives typed views of those files (semicolon-delimited type
//! tables, XML documents, or binary opcode buffers), and mutates them in
//! memory. A final write-back pass serializes every modified file into an
//! output tree mirroring the game's addon layout; untouched files are
//! never rewritten.
//!
//! ## Design guarantees
//!
//! - Each virtual path is loaded and parsed at most once per run; every
//!   transform sees the same live instance, so edits accumulate in call
//!   order.
//! - Unmodified tables and XML documents round-trip byte-identically
//!   (modulo an enforced final line terminator).
//! - Sources resolve with layered precedence: the user's loose source
//!   tree first, then the game's archive catalogs.
//! - A transform with an unsatisfiable file dependency is skipped with a
//!   diagnostic; the rest of the run proceeds.
//!
//! ## Example
//!
//! ```no_run
//! use x3_patcher::{FileManager, MemoryArchive, Result, Settings, Transform, write_files};
//!
//! fn double_shield_capacity(manager: &mut FileManager) -> Result<()> {
//!     let table = manager.load_table("types/TShields.txt")?;
//!     for row in table.data_rows_mut() {
//!         let capacity: u64 = row.get("capacity").unwrap_or("0").parse().unwrap_or(0);
//!         row.set("capacity", (capacity * 2).to_string());
//!     }
//!     Ok(())
//! }
//!
//! const TRANSFORMS: &[Transform] = &[Transform {
//!     name: "double_shield_capacity",
//!     requires: &["types/TShields.txt"],
//!     apply: double_shield_capacity,
//! }];
//!
//! fn main() -> Result<()> {
//!     let settings = Settings::new("X3/addon").with_source_dir("X3/addon/patch_source");
//!     let mut manager = FileManager::new(settings);
//!     manager.add_archive(Box::new(MemoryArchive::new("01.cat")));
//!     manager.run_all(TRANSFORMS)?;
//!     write_files(&manager).into_result()
//! }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod binary;
pub mod error;
pub mod file;
pub mod generated;
pub mod manager;
pub mod path;
pub mod resolver;
pub mod schema;
pub mod script;
pub mod table;
pub mod writer;
pub mod xml;

// Re-export commonly used types
pub use binary::BinaryFile;
pub use error::{Error, Result};
pub use file::{FileBody, GameFile};
pub use generated::{GeneratedContent, GeneratedFile};
pub use manager::{FileManager, Transform, TransformFn};
pub use path::FileKind;
pub use resolver::{ArchiveSource, DirectoryArchive, MemoryArchive, Resolver, Settings, SourceOrigin};
pub use schema::{ExtendedLayout, HeaderSpec, TableSchema, schema_for};
pub use script::{add_script, remove_script};
pub use table::{FieldKey, Row, TableFile};
pub use writer::{WriteReport, write_files};
pub use xml::XmlFile;

/// Run a full patch pass: load, transform, write back.
///
/// Convenience wrapper over [`FileManager::run_all`] and [`write_files`]
/// for callers that do not need to inspect intermediate state.
pub fn run(
    settings: Settings,
    archives: Vec<Box<dyn ArchiveSource>>,
    transforms: &[Transform],
) -> Result<WriteReport> {
    let mut manager = FileManager::new(settings);
    for archive in archives {
        manager.add_archive(archive);
    }
    manager.run_all(transforms)?;
    Ok(write_files(&manager))
}
